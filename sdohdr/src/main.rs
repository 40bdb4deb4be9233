use std::{io, net::IpAddr, path::PathBuf, process, time::Duration};

use clap::Parser;
use log::{error, info, LevelFilter};
use sdohdr::{
    parse_duration_secs, run_capture, CaptureMode, CaptureResult, PacketSource, ReplaySession,
    SdohdrConfig, StreamSource, UdpSource,
};

#[derive(Parser, Debug)]
#[command(
    name = "sdohdr",
    version = env!("CARGO_PKG_VERSION"),
    about = "Parse Uniboard SDO udp data from file, udp or stdin",
    long_about = None,
    after_help = "Examples:\n  sdohdr -f file.bin\n  sdohdr -f file.bin -t 8 -u 53234\n  nc -lu 53234 | sdohdr -f file.bin -i -t 8",
)]
struct Cli {
    /// Файл для чтения (разбор) или записи (захват)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: PathBuf,
    /// Захват по UDP на порту PORT
    #[arg(short = 'u', long = "udp", value_name = "PORT", conflicts_with = "stdin")]
    port: Option<u16>,
    /// Захват из стандартного ввода
    #[arg(short = 'i', long = "stdin")]
    stdin: bool,
    /// Длительность захвата в секундах
    #[arg(short = 't', long = "time", value_name = "SECONDS", default_value = "10.0", value_parser = parse_duration_secs)]
    duration: Duration,
    /// Максимальное число разбираемых пакетов
    #[arg(short = 'n', long = "count", value_name = "COUNT")]
    count: Option<u64>,
    /// Адрес привязки UDP-сокета
    #[arg(short = 'b', long = "bind", value_name = "ADDR", default_value = "0.0.0.0")]
    bind: IpAddr,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
    /// Подробный лог
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
}

fn main() {
    // -h → код 0, любая ошибка разбора → код 1
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let mode = match CaptureMode::from_flags(cli.port, cli.stdin) {
        Ok(m) => m,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let config = SdohdrConfig {
        mode,
        file_path: cli.file,
        duration: cli.duration,
        max_packets: cli.count,
        bind_addr: cli.bind,
        ..Default::default()
    };

    if let Err(e) = config.validate() {
        error!("{e}");
        process::exit(1);
    }

    let result = match config.mode {
        CaptureMode::Replay => replay(&config),
        CaptureMode::CaptureUdp { .. } | CaptureMode::CaptureStdin => capture(&config),
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}

fn replay(config: &SdohdrConfig) -> CaptureResult<()> {
    let session = ReplaySession::open(&config.file_path, config.max_packets)?;

    let stdout = io::stdout();
    let stderr = io::stderr();
    session.run(&mut stdout.lock(), &mut stderr.lock())?;

    Ok(())
}

fn capture(config: &SdohdrConfig) -> CaptureResult<()> {
    let mut source: Box<dyn PacketSource> = match config.udp_addr() {
        Some(addr) => Box::new(UdpSource::bind(addr, config.poll_interval)?),
        None => Box::new(StreamSource::stdin(config.poll_interval)?),
    };

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Mode          : {}", config.mode);
    info!("  Source        : {}", source.describe());
    info!("  Duration      : {:.1}s", config.duration.as_secs_f64());
    info!("  Output        : {:?}", config.file_path);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let summary = run_capture(config, source.as_mut())?;

    // Сокет/дескриптор закрываем до печати итогов
    drop(source);

    println!("{summary}");

    Ok(())
}
