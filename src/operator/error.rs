// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Gave up waiting for the operator after {waited:.0?}")]
    Timeout { waited: Duration },

    #[error("Lost contact with the operator")]
    Gone,

    #[error(transparent)]
    Radio(#[from] crate::radio::RadioError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
