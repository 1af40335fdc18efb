use parking_lot::{RwLock, RwLockReadGuard};

use crate::network::params::{Gradients, NetworkParameters};

/// Owns the network parameters and arbitrates access to them.
///
/// Forward passes of a batch share a read guard; the once-per-batch update
/// takes the write guard. Updates are computed on a staged copy and published
/// with a single swap, so readers never observe a partially updated set.
#[derive(Debug)]
pub struct ParameterStore {
    params: RwLock<NetworkParameters>,
}

/// Why an update was refused. The stored parameters are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonFiniteUpdate;

impl ParameterStore {
    pub fn new(params: NetworkParameters) -> Self {
        Self { params: RwLock::new(params) }
    }

    /// Shared read access for the duration of the guard.
    pub fn read(&self) -> RwLockReadGuard<'_, NetworkParameters> {
        self.params.read()
    }

    /// Copy of the current parameters.
    pub fn snapshot(&self) -> NetworkParameters {
        self.params.read().clone()
    }

    pub fn learning_rate(&self) -> f64 {
        self.params.read().learning_rate
    }

    pub fn set_learning_rate(&self, learning_rate: f64) {
        self.params.write().learning_rate = learning_rate;
    }

    /// Applies `learning_rate * (grads / batch_size)` as one atomic step.
    ///
    /// # Returns
    /// `NonFiniteUpdate` if the update would leave a NaN or infinite value,
    /// in which case nothing is written.
    pub fn apply_gradients(&self, grads: &Gradients, batch_size: usize) -> Result<(), NonFiniteUpdate> {
        let mut params = self.params.write();

        let mut staged = params.clone();
        staged.apply_gradients(grads, batch_size);
        if !staged.is_finite() {
            return Err(NonFiniteUpdate);
        }

        *params = staged;
        Ok(())
    }
}

impl Clone for ParameterStore {
    fn clone(&self) -> Self {
        Self::new(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::network::spec::Architecture;
    use rand::{rngs::StdRng, SeedableRng};

    fn create_test_store() -> ParameterStore {
        let params = NetworkParameters::initialize(Architecture::new(3, 4, 2), 0.1, &mut StdRng::seed_from_u64(5)).unwrap();
        ParameterStore::new(params)
    }

    #[test]
    fn test_non_finite_update_is_discarded() {
        let store = create_test_store();
        let before = store.snapshot();

        let mut grads = Gradients::zeros_like(&before);
        grads.hidden.biases[0] = f64::NAN;
        assert_eq!(store.apply_gradients(&grads, 1), Err(NonFiniteUpdate));
        assert_eq!(store.snapshot(), before);

        grads.hidden.biases[0] = f64::INFINITY;
        assert_eq!(store.apply_gradients(&grads, 1), Err(NonFiniteUpdate));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_readers_never_see_torn_updates() {
        let store = Arc::new(create_test_store());
        let mut grads = Gradients::zeros_like(&store.snapshot());
        grads.hidden.biases.iter_mut().for_each(|b| *b = -10.0);
        grads.output.biases.iter_mut().for_each(|b| *b = -10.0);

        // Every bias moves by the same amount per update, so within one
        // consistent snapshot all biases are equal.
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let params = store.read();
                        let first = params.biases1()[0];
                        assert!(params.biases1().iter().all(|&b| b == first));
                        assert!(params.biases2().iter().all(|&b| b == first));
                    }
                })
            })
            .collect();

        for _ in 0..200 {
            store.apply_gradients(&grads, 1).unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert!((store.snapshot().biases1()[0] - 200.0).abs() < 1e-9);
    }
}
