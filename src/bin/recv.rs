//! RDT 수신 서버
//!
//! RDT4.0 세션으로 데이터를 받아 파일로 저장한다.
//!
//! 사용법:
//!   cargo run --release --bin rdt-recv -- [OPTIONS]
//!
//! 예시:
//!   cargo run --release --bin rdt-recv -- -p 127.0.0.1:9100 -o received.bin -w 5

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rdt::{transfer, Config, Session};

/// 서버 설정
struct RecvConfig {
    bind_addr: SocketAddr,
    peer_addr: SocketAddr,
    output_path: Option<PathBuf>,
    config: Config,
}

impl Default for RecvConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9200".parse().unwrap(),
            peer_addr: "127.0.0.1:9100".parse().unwrap(),
            output_path: None,
            config: Config::default(),
        }
    }
}

fn parse_args() -> RecvConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RecvConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.bind_addr = args[i + 1].parse().expect("유효한 주소 필요");
                    i += 1;
                }
            }
            "--peer" | "-p" => {
                if i + 1 < args.len() {
                    config.peer_addr = args[i + 1].parse().expect("유효한 주소 필요");
                    i += 1;
                }
            }
            "--output" | "-o" => {
                if i + 1 < args.len() {
                    config.output_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--loss" => {
                if i + 1 < args.len() {
                    config.config.loss_rate = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--error" => {
                if i + 1 < args.len() {
                    config.config.error_rate = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--window" | "-w" => {
                if i + 1 < args.len() {
                    config.config.window_size = args[i + 1].parse().expect("1~255 사이 숫자 필요");
                    i += 1;
                }
            }
            "--unstable" => {
                // 손실/손상 10%, 작은 패킷, 긴 타임아웃 (윈도우 크기는 유지)
                config.config = Config::unstable_network(config.config.window_size);
            }
            "--help" | "-h" => {
                println!(
                    r#"RDT Recv - RDT4.0 수신 서버

사용법:
  cargo run --release --bin rdt-recv -- [OPTIONS]

옵션:
  -b, --bind <ADDR>     로컬 바인드 주소 (기본: 0.0.0.0:9200)
  -p, --peer <ADDR>     송신자 주소 (기본: 127.0.0.1:9100)
  -o, --output <PATH>   저장할 파일 (없으면 크기만 출력)
  --loss <RATE>         패킷 손실 확률 0.0~1.0 (기본: 0.0)
  --error <RATE>        패킷 손상 확률 0.0~1.0 (기본: 0.0)
  -w, --window <N>      윈도우 크기 (기본: 1)
  --unstable            불안정한 네트워크 프리셋 (이후 옵션이 덮어씀)
  -h, --help            이 도움말 출력
"#
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 설정
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let recv_config = parse_args();
    let config = recv_config.config.clone();

    info!(
        "Drop rate: {}, Error rate: {}, Window size: {}",
        config.loss_rate, config.error_rate, config.window_size
    );

    let mut session = Session::bind(config, recv_config.bind_addr).await?;
    session.set_peer(recv_config.peer_addr)?;
    info!("Waiting for data on {}", session.local_addr()?);

    let started = Instant::now();
    let data = transfer::receive_all(&mut session).await?;
    let elapsed = started.elapsed();

    info!(
        "Received {} bytes in {:.2}s ({:.1} KB/s)",
        data.len(),
        elapsed.as_secs_f64(),
        data.len() as f64 / 1024.0 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    if let Some(path) = &recv_config.output_path {
        std::fs::write(path, &data)?;
        info!("Saved to {:?}", path);
    }

    // 송신자의 마지막 ACK가 손실됐을 수 있으므로 TWAIT 동안 계속 응답
    session.close().await?;
    info!("{}", session.stats().summary());
    Ok(())
}
