//! Window and FFT-plan caches, keyed by size.
//!
//! Populated lazily on first use, cleared on disposal. Mirrors the
//! lock-check-compute-and-insert shape of the teacher's `AnalysisCache`.

use paulstretch_dsp::{generate_window, FftError, FftPlan, WindowShape};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lazily-populated cache of window functions, keyed by `(size, shape)`.
#[derive(Default)]
pub struct WindowCache {
    entries: Mutex<HashMap<(usize, WindowShape), Arc<Vec<f32>>>>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, size: usize, shape: WindowShape) -> Arc<Vec<f32>> {
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry((size, shape))
            .or_insert_with(|| Arc::new(generate_window(size, shape)))
            .clone()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// Lazily-populated cache of FFT twiddle-table plans, keyed by size.
#[derive(Default)]
pub struct FftPlanCache {
    entries: Mutex<HashMap<usize, Arc<FftPlan>>>,
}

impl FftPlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, size: usize) -> Result<Arc<FftPlan>, FftError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(plan) = entries.get(&size) {
            return Ok(plan.clone());
        }
        let plan = Arc::new(FftPlan::new(size)?);
        entries.insert(size, plan.clone());
        Ok(plan)
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
