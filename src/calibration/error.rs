// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with calibration estimation and calibration solutions.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("The reference signal is empty")]
    EmptyReference,

    #[error("The captured signal ({captured} samples) is shorter than the reference ({reference} samples)")]
    CaptureTooShort { captured: usize, reference: usize },

    #[error("Reference channel {got} doesn't exist; there are only {num_channels} channels")]
    BadReferenceChannel { got: usize, num_channels: usize },

    #[error("Asked to use {requested} samples, but only {available} were captured")]
    TooFewSamples { requested: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum SolutionsReadError {
    #[error("Tried to read calibration solutions file with an unsupported extension '{ext}'!")]
    UnsupportedExt { ext: String },

    #[error("Expected {thing} to have {expected} elements, but it had {actual} instead!")]
    BadShape {
        thing: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("The {thing} contain a non-finite value")]
    NonFinite { thing: &'static str },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SolutionsWriteError {
    #[error("Tried to write calibration solutions file with an unsupported extension '{ext}'!")]
    UnsupportedExt { ext: String },

    #[error(transparent)]
    Toml(#[from] toml::ser::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
