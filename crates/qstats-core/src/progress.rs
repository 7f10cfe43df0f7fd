/// Receives synchronous progress notifications from long-running exports.
///
/// Implementations must not influence control flow; they only observe.
pub trait ProgressObserver {
    fn on_step(&mut self, current: usize, total: usize, label: &str);
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_step(&mut self, _current: usize, _total: usize, _label: &str) {}
}

impl<F> ProgressObserver for F
where
    F: FnMut(usize, usize, &str),
{
    fn on_step(&mut self, current: usize, total: usize, label: &str) {
        self(current, total, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_observer_records_steps() {
        let mut seen: Vec<(usize, usize, String)> = Vec::new();
        {
            let mut observer = |c: usize, t: usize, l: &str| seen.push((c, t, l.to_string()));
            let obs: &mut dyn ProgressObserver = &mut observer;
            obs.on_step(1, 2, "first");
            obs.on_step(2, 2, "second");
        }
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], (2, 2, "second".to_string()));
    }
}
