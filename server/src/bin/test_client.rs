use clap::Parser;
use log::info;
use shared::LINE_END;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play the word game from a terminal")]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:53744")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let stream = TcpStream::connect(&args.server).await?;
    info!("Connected to {}", args.server);

    let (read_half, mut write_half) = stream.into_split();
    let mut server_lines = BufReader::new(read_half).lines();
    let mut input_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                match line? {
                    Some(line) => println!("{}", line.trim_end_matches('\r')),
                    None => {
                        println!("Server closed the connection");
                        break;
                    }
                }
            },

            line = input_lines.next_line() => {
                match line? {
                    Some(line) => {
                        write_half.write_all(line.as_bytes()).await?;
                        write_half.write_all(LINE_END.as_bytes()).await?;
                    }
                    None => break,
                }
            },
        }
    }

    Ok(())
}
