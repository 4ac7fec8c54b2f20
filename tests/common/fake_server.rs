//! Fake beanstalkd server
//!
//! Speaks just enough of the text protocol (`list-tubes`, `use`, `peek-ready`,
//! `stats-job`) to drive `BeanstalkClient` end to end over TCP or a unix socket.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Ready job ages by tube; `None` means the tube is empty
#[derive(Debug, Clone, Default)]
pub struct FakeBeanstalkd {
    tubes: BTreeMap<String, Option<u64>>,
}

impl FakeBeanstalkd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tube(mut self, name: &str, ready_age: Option<u64>) -> Self {
        self.tubes.insert(name.to_string(), ready_age);
        self
    }

    /// Serve on an ephemeral localhost TCP port
    pub async fn start_tcp(self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(self);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(Arc::clone(&server).serve(stream));
            }
        });
        addr
    }

    /// Serve on a unix socket at `path`
    #[cfg(unix)]
    pub fn start_unix(self, path: &std::path::Path) {
        let listener = tokio::net::UnixListener::bind(path).unwrap();
        let server = Arc::new(self);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(Arc::clone(&server).serve(stream));
            }
        });
    }

    fn job_id(&self, tube: &str) -> Option<u64> {
        self.tubes
            .keys()
            .position(|name| name == tube)
            .map(|index| index as u64 + 1)
    }

    async fn serve<S>(self: Arc<Self>, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut stream = BufReader::new(stream);
        let mut active = "default".to_string();

        loop {
            let mut line = String::new();
            match stream.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let words: Vec<&str> = line.split_whitespace().collect();

            let reply = match words.as_slice() {
                ["list-tubes"] => {
                    let mut body = String::from("---\n");
                    for name in self.tubes.keys() {
                        body.push_str(&format!("- {name}\n"));
                    }
                    with_body("OK", &body)
                }
                ["use", tube] => {
                    active = tube.to_string();
                    format!("USING {tube}\r\n")
                }
                ["peek-ready"] => match (self.tubes.get(&active), self.job_id(&active)) {
                    (Some(Some(_)), Some(id)) => with_body(&format!("FOUND {id}"), "payload"),
                    _ => "NOT_FOUND\r\n".to_string(),
                },
                ["stats-job", id] => {
                    let found = self.tubes.iter().find_map(|(name, age)| {
                        let age = (*age)?;
                        (self.job_id(name)?.to_string() == *id).then(|| (name.clone(), age))
                    });
                    match found {
                        Some((name, age)) => with_body("OK", &stats_body(id, &name, age)),
                        None => "NOT_FOUND\r\n".to_string(),
                    }
                }
                _ => "UNKNOWN_COMMAND\r\n".to_string(),
            };

            if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }
}

fn with_body(status: &str, body: &str) -> String {
    format!("{status} {}\r\n{body}\r\n", body.len())
}

fn stats_body(id: &str, tube: &str, age: u64) -> String {
    format!(
        "---\nid: {id}\ntube: {tube}\nstate: ready\npri: 1024\nage: {age}\ndelay: 0\nttr: 60\n"
    )
}
