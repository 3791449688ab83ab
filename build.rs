// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("sklfix")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Migrates legacy Fantome mod packages to the current skeleton asset revision")
        .arg(
            Arg::new("inputs")
                .value_name("PATH")
                .num_args(1..)
                .required(true)
                .help("Package files or directories to migrate (searched recursively)"),
        )
        .arg(
            Arg::new("out_dir")
                .long("out-dir")
                .value_name("DIR")
                .help("Output directory (default: files_updated next to the executable)"),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .value_name("FILE")
                .help("Hash registry file (default: hashes_game.json next to the executable)"),
        )
        .arg(
            Arg::new("no_pause")
                .long("no-pause")
                .action(ArgAction::SetTrue)
                .help("Skip the interactive end-of-run pause"),
        )
}

fn main() {
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR").map(PathBuf::from) {
        Ok(dir) => dir,
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("sklfix.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
