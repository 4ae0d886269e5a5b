// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser;
use log::{error, info};

use minitouchd::cli::Args;
use minitouchd::device::select::{select_device, select_explicit};
use minitouchd::device::DeviceState;
use minitouchd::error::Error;
use minitouchd::transport;

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("minitouchd starting...");

    match run(&args) {
        Ok(()) => {}
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let probed = match &args.device {
        Some(path) => select_explicit(path)?,
        None => match select_device(&args.root)? {
            Some(probed) => probed,
            None => {
                if let Some(proxy_addr) = &args.proxy {
                    transport::run_proxy(proxy_addr)?;
                    return Ok(());
                }
                return Err(minitouchd::error::DeviceError::NoSuitableDevice {
                    root: args.root.clone(),
                }
                .into());
            }
        },
    };

    info!(
        "{}: selected (score {}, {}x{}, {} contacts)",
        probed.path.display(),
        probed.score,
        probed.max_x,
        probed.max_y,
        probed.max_slot + 1
    );

    let mut device = DeviceState::from_probed(probed)?;

    if args.stdin {
        transport::run_stdin(&mut device)?;
    } else if let Some(path) = &args.file {
        transport::run_file(&mut device, path)?;
    } else {
        transport::run_socket(&mut device, &args.name)?;
    }

    Ok(())
}
