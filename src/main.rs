// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::Parser;

fn main() {
    // Returning a Result from main would print the debug representation of
    // the error; print the human-readable one instead.
    if let Err(e) = phased_fmcw::PhasedFmcw::parse().run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
