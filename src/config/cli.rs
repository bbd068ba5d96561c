//! Command-line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(name = "wifi-qr", version, author)]
#[clap(about = "Generate Wi-Fi QR codes and scan them from cameras or images")]
pub struct CliArgs {
    /// File remembering the last used camera
    #[clap(long, global = true, default_value = "wifi-qr-state.json")]
    pub state_file: PathBuf,

    /// Directory of recorded camera devices, one subdirectory per camera
    #[clap(long, global = true, default_value = "cameras")]
    pub camera_root: PathBuf,

    /// Delay between frame samples in milliseconds
    #[clap(long, global = true, default_value = "16")]
    pub frame_interval_ms: u64,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encode credentials and render a QR code
    Generate {
        /// Network name
        #[clap(long)]
        ssid: String,

        /// Network password, omitted for open networks
        #[clap(long, default_value = "")]
        password: String,

        /// Authentication type (WPA, WEP or nopass)
        #[clap(long, default_value = "WPA")]
        auth: String,

        /// Network does not broadcast its SSID
        #[clap(long)]
        hidden: bool,

        /// Write a labeled PNG into this directory
        #[clap(short, long)]
        output_dir: Option<PathBuf>,

        /// Copy the payload text to the clipboard
        #[clap(long)]
        copy: bool,
    },

    /// Parse a payload string
    Decode {
        /// Payload text, e.g. "WIFI:T:WPA;S:Home;P:secret;;"
        payload: String,
    },

    /// Look for a Wi-Fi code in an image file
    ScanImage {
        /// Image to scan
        path: PathBuf,

        /// Copy the password of a detected network to the clipboard
        #[clap(long)]
        copy_password: bool,
    },

    /// List available cameras
    Devices,

    /// Scan a camera until a Wi-Fi code is found
    Scan {
        /// Camera to use instead of the remembered or rear one
        #[clap(short, long)]
        device: Option<String>,

        /// Save the detected code as a PNG at this path
        #[clap(long)]
        snapshot: Option<PathBuf>,

        /// Copy the password of a detected network to the clipboard
        #[clap(long)]
        copy_password: bool,
    },
}
