use tableproc_api::PROC_TABLE_API_VERSION;
use tableproc_frame::MAX_FRAME_SIZE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("tableproc {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: tableproc");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("api_version: {PROC_TABLE_API_VERSION}");
    println!("max_frame_size: {MAX_FRAME_SIZE}");
    println!(
        "build_target: {}",
        option_env!("TABLEPROC_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("TABLEPROC_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);

    Ok(SUCCESS)
}
