//! A stress-test client: spawns many concurrent connections that register, join a
//! shared channel, and send PRIVMSGs at a fixed interval. Grounded on the load-test
//! binary this codebase ships (`irc_client_tests.rs` upstream); adapted to this
//! server's registration sequence, which requires `PASS` before `NICK`/`USER`.

use std::error::Error;

use tokio::io::{self, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let server_addr = args.next().unwrap_or_else(|| "127.0.0.1:6667".to_string());
    let password = args.next().unwrap_or_else(|| "secret".to_string());
    let num_clients: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(100);
    let interval_ms = 1000;

    println!("starting stress test: {num_clients} clients against {server_addr}");

    for id in 0..num_clients {
        let addr = server_addr.clone();
        let password = password.clone();
        tokio::spawn(async move {
            if let Err(err) = run_client(id, &addr, &password, interval_ms).await {
                eprintln!("client {id} error: {err}");
            }
        });
        // Small delay between spawns so the OS accept queue isn't hammered all at once.
        time::sleep(Duration::from_millis(5)).await;
    }

    std::future::pending::<()>().await;
    Ok(())
}

async fn run_client(id: usize, addr: &str, password: &str, interval_ms: u64) -> io::Result<()> {
    let mut stream = TcpStream::connect(addr).await?;
    let nick = format!("bot{id}");

    let login = format!("PASS {password}\r\nNICK {nick}\r\nUSER {nick} 0 * :Load Tester\r\n");
    stream.write_all(login.as_bytes()).await?;
    stream.write_all(b"JOIN #stress_test\r\n").await?;

    let mut ticker = time::interval(Duration::from_millis(interval_ms));
    let mut counter = 0usize;
    loop {
        ticker.tick().await;
        let msg = format!("PRIVMSG #stress_test :message {counter} from {nick}\r\n");
        counter += 1;
        if stream.write_all(msg.as_bytes()).await.is_err() {
            break;
        }
    }
    Ok(())
}
