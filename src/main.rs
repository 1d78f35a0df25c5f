/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Main executable for holoscat-rs

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    holoscat_rs::cli::run(std::env::args().skip(1))
}
