//! Converts shell-like configuration to JSON
//!
//! Every `NAME=value` argument appends `value` to the variable `NAME`; any
//! other argument is loaded as a configuration file. Arguments are handled
//! in order, so variables given before a file are visible to it.
//!
//! ```text
//! cargo run --example shlike2json -- PREFIX=/opt tests/fixtures/example.conf
//! ```

use shlike::{Config, SimpleConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SimpleConfig::new();

    for arg in std::env::args().skip(1) {
        match arg.split_once('=') {
            Some((name, value)) => config.append(name, vec![value.to_owned()]),
            None => {
                for warning in config.load(&arg)? {
                    eprintln!("{warning}");
                }
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
