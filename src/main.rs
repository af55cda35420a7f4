// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

use lonelypsp::{
    cli::{run, Args},
    clap::Parser,
};

fn main() {
    let args = Args::parse();
    match run(args) {
        Ok(output) => println!("{}", output),
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(1);
        }
    }
}
