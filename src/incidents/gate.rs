//! Gated progression: an ordered set of completable items plus a threshold
//! predicate that blocks a workflow step until enough items are done. The
//! investigation checklist uses it; any other completion-ratio gate (e.g.
//! training quiz passing) can share the same implementation.

use super::error::IncidentError;

pub trait Completable {
    fn is_complete(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct Gate {
    pub name: String,
    pub threshold: f64,
}

impl Gate {
    pub fn new(name: impl Into<String>, threshold: f64) -> Self {
        Self {
            name: name.into(),
            threshold,
        }
    }

    pub fn evaluate<T: Completable>(&self, items: &[T]) -> GateProgress {
        GateProgress {
            gate: self.name.clone(),
            completed: items.iter().filter(|item| item.is_complete()).count(),
            total: items.len(),
            threshold: self.threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateProgress {
    pub gate: String,
    pub completed: usize,
    pub total: usize,
    pub threshold: f64,
}

impl GateProgress {
    /// An empty item set satisfies the gate; there is nothing left to do.
    pub fn satisfied(&self) -> bool {
        if self.total == 0 {
            return true;
        }
        self.completed as f64 / self.total as f64 >= self.threshold
    }

    pub fn require(&self) -> Result<(), IncidentError> {
        if self.satisfied() {
            Ok(())
        } else {
            Err(IncidentError::GateNotMet(format!(
                "{} requires {:.0}% of items complete, currently {}/{}",
                self.gate,
                self.threshold * 100.0,
                self.completed,
                self.total
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(bool);

    impl Completable for Item {
        fn is_complete(&self) -> bool {
            self.0
        }
    }

    fn items(completed: usize, total: usize) -> Vec<Item> {
        (0..total).map(|i| Item(i < completed)).collect()
    }

    #[test]
    fn four_of_six_blocks_at_seventy_percent() {
        let gate = Gate::new("initial assessment", 0.7);
        let progress = gate.evaluate(&items(4, 6));
        assert!(!progress.satisfied());
        assert!(matches!(
            progress.require(),
            Err(IncidentError::GateNotMet(_))
        ));
    }

    #[test]
    fn five_of_six_passes_at_seventy_percent() {
        let gate = Gate::new("initial assessment", 0.7);
        let progress = gate.evaluate(&items(5, 6));
        assert!(progress.satisfied());
        assert!(progress.require().is_ok());
    }

    #[test]
    fn empty_item_set_is_satisfied() {
        let gate = Gate::new("empty", 0.7);
        assert!(gate.evaluate(&items(0, 0)).satisfied());
    }

    #[test]
    fn error_names_the_gate_and_progress() {
        let gate = Gate::new("initial assessment", 0.7);
        let err = gate.evaluate(&items(2, 6)).require().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("initial assessment"));
        assert!(message.contains("2/6"));
        assert!(message.contains("70%"));
    }
}
