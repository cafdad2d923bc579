//! # Tickforge ML
//!
//! Closing-price regression over cleaned quote rows.
//!
//! [`fit`] filters the rows to one symbol, projects the fixed feature
//! columns (open, high, low, volume) against the close target, splits
//! train/test with a seeded shuffle, and trains three regressors of
//! different families on the same split: linear (`linfa-linear`), random
//! forest (`smartcore`), and RBF support-vector regression (`linfa-svm`).
//! Each model is evaluated on the same held-out split and summarized as a
//! [`MetricReport`]. Nothing is persisted.

use std::fmt::{Display, Formatter};

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use thiserror::Error;
use tracing::info;

use tickforge_core::{Quote, Symbol};

/// Fraction of rows used for training; the rest is held out.
const TRAIN_RATIO: f32 = 0.8;
/// Fixed shuffle seed so reruns split identically.
const SPLIT_SEED: u64 = 42;
/// Fewest rows that still leave a meaningful held-out split.
const MIN_ROWS: usize = 10;

const FOREST_TREES: usize = 100;

/// Errors raised by the modeling stage.
#[derive(Debug, Error)]
pub enum ModelingError {
    #[error("no cleaned rows available for symbol {symbol}")]
    NoRows { symbol: String },

    #[error("{rows} rows for symbol {symbol} is too few to model (minimum {min})")]
    TooFewRows {
        symbol: String,
        rows: usize,
        min: usize,
    },

    #[error("{model} training failed: {message}")]
    Training { model: ModelKind, message: String },
}

/// The three regressor families trained per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Linear,
    RandomForest,
    SupportVector,
}

impl ModelKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Linear => "Linear Regression",
            Self::RandomForest => "Random Forest",
            Self::SupportVector => "Support Vector Machine",
        }
    }
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-model error summary over the held-out split. Ephemeral.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReport {
    pub model: ModelKind,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
}

/// Fit all three regressors for one symbol and report their errors.
pub fn fit(rows: &[Quote], symbol: &Symbol) -> Result<Vec<MetricReport>, ModelingError> {
    let filtered: Vec<&Quote> = rows
        .iter()
        .filter(|quote| quote.symbol == symbol.as_str())
        .collect();

    if filtered.is_empty() {
        return Err(ModelingError::NoRows {
            symbol: symbol.as_str().to_owned(),
        });
    }
    if filtered.len() < MIN_ROWS {
        return Err(ModelingError::TooFewRows {
            symbol: symbol.as_str().to_owned(),
            rows: filtered.len(),
            min: MIN_ROWS,
        });
    }

    let records = Array2::from_shape_fn((filtered.len(), 4), |(row, column)| match column {
        0 => filtered[row].open,
        1 => filtered[row].high,
        2 => filtered[row].low,
        _ => filtered[row].volume as f64,
    });
    let targets: Array1<f64> = filtered.iter().map(|quote| quote.close).collect();

    let dataset = Dataset::new(records, targets);
    let mut rng = SmallRng::seed_from_u64(SPLIT_SEED);
    let shuffled = dataset.shuffle(&mut rng);
    let (train, test) = shuffled.split_with_ratio(TRAIN_RATIO);

    info!(
        symbol = symbol.as_str(),
        train = train.nsamples(),
        test = test.nsamples(),
        "fitting models"
    );

    let reports = vec![
        fit_linear(&train, &test)?,
        fit_forest(&train, &test)?,
        fit_svm(&train, &test)?,
    ];

    for report in &reports {
        info!(
            model = report.model.label(),
            mae = report.mean_absolute_error,
            rmse = report.root_mean_squared_error,
            "model evaluated"
        );
    }

    Ok(reports)
}

type QuoteDataset = Dataset<f64, f64, ndarray::Ix1>;

fn fit_linear(train: &QuoteDataset, test: &QuoteDataset) -> Result<MetricReport, ModelingError> {
    let model = LinearRegression::default()
        .fit(train)
        .map_err(|error| training_error(ModelKind::Linear, error))?;
    let prediction = model.predict(test);
    Ok(report(ModelKind::Linear, test.targets(), &prediction))
}

fn fit_forest(train: &QuoteDataset, test: &QuoteDataset) -> Result<MetricReport, ModelingError> {
    let parameters = RandomForestRegressorParameters::default()
        .with_n_trees(FOREST_TREES)
        .with_seed(SPLIT_SEED);
    let model = RandomForestRegressor::fit(train.records(), train.targets(), parameters)
        .map_err(|error| training_error(ModelKind::RandomForest, error))?;
    let prediction = model
        .predict(test.records())
        .map_err(|error| training_error(ModelKind::RandomForest, error))?;
    Ok(report(ModelKind::RandomForest, test.targets(), &prediction))
}

fn fit_svm(train: &QuoteDataset, test: &QuoteDataset) -> Result<MetricReport, ModelingError> {
    let model = Svm::<f64, f64>::params()
        .c_eps(100.0, 0.1)
        .gaussian_kernel(50.0)
        .fit(train)
        .map_err(|error| training_error(ModelKind::SupportVector, error))?;
    let prediction = model.predict(test);
    Ok(report(ModelKind::SupportVector, test.targets(), &prediction))
}

fn report(model: ModelKind, truth: &Array1<f64>, prediction: &Array1<f64>) -> MetricReport {
    let residual = truth - prediction;
    let mean_absolute_error = residual.mapv(f64::abs).mean().unwrap_or(f64::NAN);
    let root_mean_squared_error = residual
        .mapv(|error| error * error)
        .mean()
        .unwrap_or(f64::NAN)
        .sqrt();
    MetricReport {
        model,
        mean_absolute_error,
        root_mean_squared_error,
    }
}

fn training_error(model: ModelKind, error: impl Display) -> ModelingError {
    ModelingError::Training {
        model,
        message: error.to_string(),
    }
}
