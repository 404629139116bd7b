//! Refresh-then-derive pipeline.
//!
//! Nothing is loaded or derived until [`Pipeline::initialize`] is called.
//! Initializing again on unchanged source data reproduces the same state.

use crate::{
    config::PipelineConfig,
    error::{Error, Result},
};
use finhealth_data::{PanelSource, PanelStore, SecurityCode};
use finhealth_metrics::{
    FeatureBuilder, FeatureRow, FiscalQuarter, ProfitabilityRecord, ProfitabilityTable,
    TrailingProfile, compose, default_feature_columns, derive_from_store, features_to_frame,
    trailing_profiles,
};
use polars::prelude::DataFrame;
use std::sync::{Arc, RwLock};

/// Everything derived from one consistent store state.
#[derive(Debug, Clone)]
pub struct Derived {
    /// Latest reported quarter (offset 0 of the feature rows)
    pub quarter: FiscalQuarter,
    /// Profitability by quarter and security
    pub profitability: ProfitabilityTable,
    /// Composed feature rows, one per security with valuation multiples
    pub features: Vec<FeatureRow>,
    /// Trailing four-quarter profiles, in feature row order
    pub trailing: Vec<TrailingProfile>,
}

impl Derived {
    /// Profitability history of one security, oldest quarter first.
    pub fn history(&self, code: &SecurityCode) -> Vec<&ProfitabilityRecord> {
        self.profitability.for_security(code)
    }

    /// Feature row of one security.
    pub fn feature(&self, code: &SecurityCode) -> Option<&FeatureRow> {
        self.features.iter().find(|row| &row.code == code)
    }

    /// Feature rows as a DataFrame with the default export columns.
    pub fn features_frame(&self) -> Result<DataFrame> {
        Ok(features_to_frame(&self.features, &default_feature_columns())?)
    }
}

/// Owns the panel store and the derived state.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    store: PanelStore,
    builder: FeatureBuilder,
    derived: Option<Derived>,
}

impl Pipeline {
    /// Create an uninitialized pipeline.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let builder = FeatureBuilder::new(config.features.clone())?;
        Ok(Self {
            store: PanelStore::with_windows(config.windows.clone()),
            config,
            builder,
            derived: None,
        })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Panel store.
    pub const fn store(&self) -> &PanelStore {
        &self.store
    }

    /// State derived by the last [`initialize`](Self::initialize), if any.
    pub const fn derived(&self) -> Option<&Derived> {
        self.derived.as_ref()
    }

    /// Refresh every panel from `source` and re-derive.
    ///
    /// The refresh and derivation run against a fresh store. On failure the
    /// pipeline keeps its previous store and derived state.
    pub fn initialize<S: PanelSource + ?Sized>(&mut self, source: &S) -> Result<&Derived> {
        let store = PanelStore::load_all(self.config.windows.clone(), source)?;
        let derived = derive_with(&self.builder, &store)?;
        self.store = store;
        Ok(self.derived.insert(derived))
    }

    /// Derive profitability, features and trailing profiles from the current
    /// store without touching it.
    pub fn derive(&self) -> Result<Derived> {
        derive_with(&self.builder, &self.store)
    }
}

fn derive_with(builder: &FeatureBuilder, store: &PanelStore) -> Result<Derived> {
    let profitability = derive_from_store(store)?;
    let quarter = FiscalQuarter::reported_by(store.latest_statement_date()?);
    let rows = builder.build_from_store(store, &profitability)?;
    let features = compose(rows, &store.latest_prices()?, store.securities()?);
    let trailing = trailing_profiles(&features);

    tracing::info!(
        %quarter,
        profitability = profitability.len(),
        features = features.len(),
        "derived metrics"
    );
    Ok(Derived {
        quarter,
        profitability,
        features,
        trailing,
    })
}

/// A [`Pipeline`] behind a single-writer lock.
///
/// A refresh-then-derive holds the write lock for its whole duration, so
/// readers never observe a partially refreshed store.
#[derive(Debug, Clone)]
pub struct SharedPipeline {
    inner: Arc<RwLock<Pipeline>>,
}

impl SharedPipeline {
    /// Wrap a pipeline.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pipeline)),
        }
    }

    /// Refresh from `source` and re-derive under exclusive access.
    pub fn refresh_and_derive<S: PanelSource + ?Sized>(&self, source: &S) -> Result<Derived> {
        let mut pipeline = self.inner.write().map_err(|_| Error::Poisoned)?;
        pipeline.initialize(source).cloned()
    }

    /// Run `f` against a consistent view of the pipeline.
    pub fn read<R>(&self, f: impl FnOnce(&Pipeline) -> R) -> Result<R> {
        let pipeline = self.inner.read().map_err(|_| Error::Poisoned)?;
        Ok(f(&pipeline))
    }

    /// Copy of the last derived state.
    pub fn derived(&self) -> Result<Option<Derived>> {
        self.read(|pipeline| pipeline.derived().cloned())
    }
}
