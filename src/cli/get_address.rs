//! `getAddress <path>`: ask the app for the public key at a derivation
//! path and print it as hex, or the whole answer as JSON.

use std::io::Write;

use anyhow::Context;

use crate::api::{AppOptions, LedgerApp};
use crate::protocol::ChunkProtocol;
use crate::transport::{TransportType, SPECULOS_APDU_PORT, SPECULOS_DEFAULT_HOST};
use crate::types::AddressResult;

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct GetAddressArgs {
    /// Bip32 path of the public key to provide, e.g. 44'/1'/0'/0/0
    pub path: String,
    /// Connect to a speculos instance instead of a real ledger; use --apdu-port 5555 when running speculos to enable.
    #[clap(long)]
    pub speculos: bool,
    /// Host of the speculos APDU socket
    #[clap(long, default_value = SPECULOS_DEFAULT_HOST)]
    pub speculos_host: String,
    /// Port of the speculos APDU socket
    #[clap(long, default_value_t = SPECULOS_APDU_PORT)]
    pub speculos_port: u16,
    /// Use block protocol
    #[clap(long = "useBlock")]
    pub use_block: bool,
    /// Output all fields from getAddress in json format
    #[clap(long)]
    pub json: bool,
    /// Print verbose output of message transfer with ledger
    #[clap(long)]
    pub verbose: bool,
    /// Verify the address on device by showing a prompt
    #[clap(long)]
    pub verify: bool,
}

impl GetAddressArgs {
    /// Speculos when `--speculos` is given, otherwise the first USB device.
    pub fn transport_type(&self) -> TransportType {
        if self.speculos {
            TransportType::TCP(self.speculos_host.clone(), self.speculos_port)
        } else {
            TransportType::NativeHID
        }
    }

    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            protocol: if self.use_block {
                ChunkProtocol::Block
            } else {
                ChunkProtocol::Apdu
            },
            verbose: self.verbose,
        }
    }
}

/// Open the device, issue the one request and write the answer to `out`.
///
/// The connection is closed when this returns, whether or not the request
/// succeeded. Errors are passed up untouched.
pub fn run(args: &GetAddressArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let transport_type = args.transport_type();
    log::debug!("opening {transport_type:?}");
    let app = LedgerApp::new(&transport_type, args.app_options())?;
    query(&app, args, out)
}

/// Issue the request selected by `args` on an already open session.
pub fn query(app: &LedgerApp, args: &GetAddressArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    log::debug!("sending request with {} protocol", app.protocol());
    let result = if args.verify {
        app.verify_address(&args.path)?
    } else {
        app.get_pubkey(&args.path)?
    };
    render(&result, args.json, out).context("failed to write output")
}

/// Hex public key plus newline, or the pretty-printed JSON document with
/// no trailing newline.
pub fn render(result: &AddressResult, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, result)?;
    } else {
        writeln!(out, "{}", result.public_key)?;
    }
    out.flush()?;
    Ok(())
}
