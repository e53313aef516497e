//! In-process RESP2 server for integration tests
//!
//! Understands enough of the command set to exercise the client: strings,
//! hashes, lists, pub/sub, AUTH and SELECT. Two extra commands help with
//! failure paths: `MOCK.DROP` closes the connection without replying and
//! `MOCK.SLEEP ms` delays its `+OK`.

#![allow(dead_code)]

use bytes::{Buf, Bytes, BytesMut};
use parking_lot::Mutex;
use redis_keeper::protocol::{RespDecoder, RespEncoder};
use redis_keeper::{Configuration, PoolConfig, RespValue};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

enum Entry {
    Str(Bytes),
    Hash(Vec<(Bytes, Bytes)>),
    List(VecDeque<Bytes>),
}

struct Stored {
    entry: Entry,
    ttl: Option<i64>,
}

struct Shared {
    keys: Mutex<HashMap<(u32, Bytes), Stored>>,
    subscribers: Mutex<HashMap<Bytes, usize>>,
    commands: Mutex<Vec<Vec<String>>>,
    accepted: AtomicUsize,
    open: AtomicUsize,
    username: Option<String>,
    password: Option<String>,
    pubsub: broadcast::Sender<(Bytes, Bytes)>,
}

/// Handle to a running mock server. The server lives until the test's runtime shuts down.
pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::spawn(None, None).await
    }

    pub async fn with_auth(username: Option<&str>, password: &str) -> Self {
        Self::spawn(username.map(str::to_string), Some(password.to_string())).await
    }

    async fn spawn(username: Option<String>, password: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (pubsub, _) = broadcast::channel(64);

        let shared = Arc::new(Shared {
            keys: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
            accepted: AtomicUsize::new(0),
            open: AtomicUsize::new(0),
            username,
            password,
            pubsub,
        });

        let accept_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accept_shared.accepted.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, Arc::clone(&accept_shared)));
            }
        });

        Self { addr, shared }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Client configuration pointing at this server with short timeouts
    pub fn config(&self) -> Configuration {
        Configuration::new(self.addr.ip().to_string(), self.addr.port())
            .with_connect_timeout(Duration::from_secs(1))
            .with_read_timeout(Some(Duration::from_secs(2)))
            .with_write_timeout(Some(Duration::from_secs(2)))
            .with_tcp_keepalive(None)
    }

    pub fn config_with_pool(&self, pool: PoolConfig) -> Configuration {
        self.config().with_pool(pool)
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.shared.accepted.load(Ordering::SeqCst)
    }

    /// Connections currently open
    pub fn open(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Every command received, as strings, in arrival order
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.shared.commands.lock().clone()
    }

    /// Received commands whose name is `name`
    pub fn commands_named(&self, name: &str) -> Vec<Vec<String>> {
        self.commands()
            .into_iter()
            .filter(|c| c.first().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .collect()
    }

    /// Wait until exactly `count` connections are open on the server side
    pub async fn wait_for_open(&self, count: usize) {
        for _ in 0..100 {
            if self.open() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} open connections, found {}", count, self.open());
    }
}

enum Action {
    Reply(Vec<RespValue>),
    Delayed(Duration, RespValue),
    Close(Option<RespValue>),
}

struct Session {
    db: u32,
    authed: bool,
    channels: HashSet<Bytes>,
}

async fn serve(mut stream: TcpStream, shared: Arc<Shared>) {
    shared.open.fetch_add(1, Ordering::SeqCst);

    let mut session = Session {
        db: 0,
        authed: shared.password.is_none(),
        channels: HashSet::new(),
    };
    let mut messages = shared.pubsub.subscribe();
    let mut buf = BytesMut::with_capacity(4096);

    'conn: loop {
        loop {
            let mut cursor = Cursor::new(&buf[..]);
            let frame = match RespDecoder::decode(&mut cursor) {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(_) => break 'conn,
            };
            let consumed = cursor.position() as usize;
            buf.advance(consumed);

            let RespValue::Array(items) = frame else {
                break 'conn;
            };
            let args: Vec<Bytes> = items
                .into_iter()
                .filter_map(|item| match item {
                    RespValue::BulkString(b) => Some(b),
                    _ => None,
                })
                .collect();

            match session.dispatch(&shared, args) {
                Action::Reply(replies) => {
                    for reply in replies {
                        if write(&mut stream, &reply).await.is_err() {
                            break 'conn;
                        }
                    }
                }
                Action::Delayed(delay, reply) => {
                    tokio::time::sleep(delay).await;
                    if write(&mut stream, &reply).await.is_err() {
                        break 'conn;
                    }
                }
                Action::Close(reply) => {
                    if let Some(reply) = reply {
                        let _ = write(&mut stream, &reply).await;
                    }
                    break 'conn;
                }
            }
        }

        tokio::select! {
            read = stream.read_buf(&mut buf) => match read {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            },
            msg = messages.recv() => {
                if let Ok((channel, payload)) = msg {
                    if session.channels.contains(&channel) {
                        let frame = array(vec![
                            bulk("message"),
                            RespValue::BulkString(channel),
                            RespValue::BulkString(payload),
                        ]);
                        if write(&mut stream, &frame).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    let mut subscribers = shared.subscribers.lock();
    for channel in &session.channels {
        if let Some(count) = subscribers.get_mut(channel) {
            *count = count.saturating_sub(1);
        }
    }
    drop(subscribers);
    shared.open.fetch_sub(1, Ordering::SeqCst);
}

async fn write(stream: &mut TcpStream, value: &RespValue) -> std::io::Result<()> {
    let mut out = BytesMut::new();
    RespEncoder::encode(value, &mut out);
    stream.write_all(&out).await?;
    stream.flush().await
}

fn text(b: &Bytes) -> String {
    String::from_utf8_lossy(b).into_owned()
}

fn number(b: &Bytes) -> Option<i64> {
    text(b).parse().ok()
}

fn float(b: &Bytes) -> Option<f64> {
    text(b).parse().ok()
}

fn ok() -> RespValue {
    RespValue::SimpleString("OK".to_string())
}

fn bulk(s: &str) -> RespValue {
    RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes()))
}

fn error(msg: &str) -> RespValue {
    RespValue::Error(msg.to_string())
}

fn array(items: Vec<RespValue>) -> RespValue {
    RespValue::Array(items)
}

fn one(value: RespValue) -> Action {
    Action::Reply(vec![value])
}

fn wrong_arity(name: &str) -> Action {
    one(error(&format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_lowercase()
    )))
}

fn wrong_type() -> Action {
    one(error(
        "WRONGTYPE Operation against a key holding the wrong kind of value",
    ))
}

fn list_range(len: usize, start: i64, stop: i64) -> std::ops::Range<usize> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        0..0
    } else {
        start as usize..stop as usize + 1
    }
}

impl Session {
    fn dispatch(&mut self, shared: &Shared, args: Vec<Bytes>) -> Action {
        let Some(first) = args.first() else {
            return one(error("ERR empty command"));
        };
        let name = text(first).to_ascii_uppercase();
        shared
            .commands
            .lock()
            .push(args.iter().map(text).collect());
        let args = &args[1..];

        if !self.authed && name != "AUTH" && name != "QUIT" {
            return one(error("NOAUTH Authentication required."));
        }

        match name.as_str() {
            "PING" => match args.first() {
                Some(msg) => one(RespValue::BulkString(msg.clone())),
                None => one(RespValue::SimpleString("PONG".to_string())),
            },
            "ECHO" if args.len() == 1 => one(RespValue::BulkString(args[0].clone())),
            "QUIT" => Action::Close(Some(ok())),
            "AUTH" => self.auth(shared, args),
            "SELECT" if args.len() == 1 => match number(&args[0]) {
                Some(db) if (0..16).contains(&db) => {
                    self.db = db as u32;
                    one(ok())
                }
                _ => one(error("ERR DB index is out of range")),
            },
            "FLUSHDB" => {
                let db = self.db;
                shared.keys.lock().retain(|(d, _), _| *d != db);
                one(ok())
            }
            "FLUSHALL" => {
                shared.keys.lock().clear();
                one(ok())
            }
            "SET" if args.len() >= 2 => self.set(shared, args),
            "GET" if args.len() == 1 => {
                let keys = shared.keys.lock();
                match keys.get(&(self.db, args[0].clone())) {
                    None => one(RespValue::Null),
                    Some(Stored {
                        entry: Entry::Str(v),
                        ..
                    }) => one(RespValue::BulkString(v.clone())),
                    Some(_) => wrong_type(),
                }
            }
            "DEL" | "EXISTS" if !args.is_empty() => {
                let mut keys = shared.keys.lock();
                let mut count = 0;
                for key in args {
                    let key = (self.db, key.clone());
                    let hit = if name == "DEL" {
                        keys.remove(&key).is_some()
                    } else {
                        keys.contains_key(&key)
                    };
                    if hit {
                        count += 1;
                    }
                }
                one(RespValue::Integer(count))
            }
            "KEYS" if args.len() == 1 => {
                let pattern = text(&args[0]);
                let prefix = pattern.trim_end_matches('*');
                let exact = !pattern.ends_with('*');
                let keys = shared.keys.lock();
                let mut found: Vec<String> = keys
                    .keys()
                    .filter(|(db, _)| *db == self.db)
                    .map(|(_, k)| text(k))
                    .filter(|k| if exact { k == prefix } else { k.starts_with(prefix) })
                    .collect();
                found.sort();
                one(array(found.iter().map(|k| bulk(k)).collect()))
            }
            "EXPIRE" if args.len() == 2 => {
                let mut keys = shared.keys.lock();
                match (keys.get_mut(&(self.db, args[0].clone())), number(&args[1])) {
                    (Some(stored), Some(secs)) => {
                        stored.ttl = Some(secs);
                        one(RespValue::Integer(1))
                    }
                    (None, Some(_)) => one(RespValue::Integer(0)),
                    (_, None) => one(error("ERR value is not an integer or out of range")),
                }
            }
            "TTL" if args.len() == 1 => {
                let keys = shared.keys.lock();
                let ttl = match keys.get(&(self.db, args[0].clone())) {
                    None => -2,
                    Some(stored) => stored.ttl.unwrap_or(-1),
                };
                one(RespValue::Integer(ttl))
            }
            "INCR" | "DECR" if args.len() == 1 => {
                let delta = if name == "INCR" { 1 } else { -1 };
                self.incr(shared, &args[0], delta)
            }
            "INCRBY" | "DECRBY" if args.len() == 2 => match number(&args[1]) {
                Some(n) => {
                    let delta = if name == "INCRBY" { n } else { -n };
                    self.incr(shared, &args[0], delta)
                }
                None => one(error("ERR value is not an integer or out of range")),
            },
            "INCRBYFLOAT" if args.len() == 2 => match float(&args[1]) {
                Some(delta) => self.incr_float(shared, &args[0], delta),
                None => one(error("ERR value is not a valid float")),
            },
            "HINCRBY" if args.len() == 3 => match number(&args[2]) {
                Some(delta) => self.hincr(shared, args, |current| {
                    number(current).map(|n| RespValue::Integer(n + delta))
                }),
                None => one(error("ERR value is not an integer or out of range")),
            },
            "HINCRBYFLOAT" if args.len() == 3 => match float(&args[2]) {
                Some(delta) => self.hincr(shared, args, |current| {
                    float(current).map(|n| bulk(&(n + delta).to_string()))
                }),
                None => one(error("ERR value is not a valid float")),
            },
            "HSET" if args.len() == 3 => {
                let mut keys = shared.keys.lock();
                let stored = keys.entry((self.db, args[0].clone())).or_insert(Stored {
                    entry: Entry::Hash(Vec::new()),
                    ttl: None,
                });
                let Entry::Hash(fields) = &mut stored.entry else {
                    return wrong_type();
                };
                match fields.iter_mut().find(|(f, _)| *f == args[1]) {
                    Some((_, v)) => {
                        *v = args[2].clone();
                        one(RespValue::Integer(0))
                    }
                    None => {
                        fields.push((args[1].clone(), args[2].clone()));
                        one(RespValue::Integer(1))
                    }
                }
            }
            "HGET" if args.len() == 2 => {
                let keys = shared.keys.lock();
                match keys.get(&(self.db, args[0].clone())) {
                    None => one(RespValue::Null),
                    Some(Stored {
                        entry: Entry::Hash(fields),
                        ..
                    }) => one(
                        fields
                            .iter()
                            .find(|(f, _)| *f == args[1])
                            .map_or(RespValue::Null, |(_, v)| RespValue::BulkString(v.clone())),
                    ),
                    Some(_) => wrong_type(),
                }
            }
            "HGETALL" if args.len() == 1 => {
                let keys = shared.keys.lock();
                match keys.get(&(self.db, args[0].clone())) {
                    None => one(array(Vec::new())),
                    Some(Stored {
                        entry: Entry::Hash(fields),
                        ..
                    }) => one(array(
                        fields
                            .iter()
                            .flat_map(|(f, v)| {
                                [RespValue::BulkString(f.clone()), RespValue::BulkString(v.clone())]
                            })
                            .collect(),
                    )),
                    Some(_) => wrong_type(),
                }
            }
            "LPUSH" | "RPUSH" if args.len() >= 2 => {
                let mut keys = shared.keys.lock();
                let stored = keys.entry((self.db, args[0].clone())).or_insert(Stored {
                    entry: Entry::List(VecDeque::new()),
                    ttl: None,
                });
                let Entry::List(list) = &mut stored.entry else {
                    return wrong_type();
                };
                for value in &args[1..] {
                    if name == "LPUSH" {
                        list.push_front(value.clone());
                    } else {
                        list.push_back(value.clone());
                    }
                }
                one(RespValue::Integer(list.len() as i64))
            }
            "LRANGE" if args.len() == 3 => {
                let (Some(start), Some(stop)) = (number(&args[1]), number(&args[2])) else {
                    return one(error("ERR value is not an integer or out of range"));
                };
                let keys = shared.keys.lock();
                match keys.get(&(self.db, args[0].clone())) {
                    None => one(array(Vec::new())),
                    Some(Stored {
                        entry: Entry::List(list),
                        ..
                    }) => one(array(
                        list.range(list_range(list.len(), start, stop))
                            .map(|v| RespValue::BulkString(v.clone()))
                            .collect(),
                    )),
                    Some(_) => wrong_type(),
                }
            }
            "PUBLISH" if args.len() == 2 => {
                let receivers = shared
                    .subscribers
                    .lock()
                    .get(&args[0])
                    .copied()
                    .unwrap_or(0);
                let _ = shared.pubsub.send((args[0].clone(), args[1].clone()));
                one(RespValue::Integer(receivers as i64))
            }
            "SUBSCRIBE" if !args.is_empty() => {
                let mut subscribers = shared.subscribers.lock();
                let mut replies = Vec::new();
                for channel in args {
                    if self.channels.insert(channel.clone()) {
                        *subscribers.entry(channel.clone()).or_insert(0) += 1;
                    }
                    replies.push(array(vec![
                        bulk("subscribe"),
                        RespValue::BulkString(channel.clone()),
                        RespValue::Integer(self.channels.len() as i64),
                    ]));
                }
                Action::Reply(replies)
            }
            "UNSUBSCRIBE" => {
                let targets: Vec<Bytes> = if args.is_empty() {
                    self.channels.iter().cloned().collect()
                } else {
                    args.to_vec()
                };
                if targets.is_empty() {
                    return one(array(vec![
                        bulk("unsubscribe"),
                        RespValue::Null,
                        RespValue::Integer(0),
                    ]));
                }
                let mut subscribers = shared.subscribers.lock();
                let mut replies = Vec::new();
                for channel in targets {
                    if self.channels.remove(&channel) {
                        if let Some(count) = subscribers.get_mut(&channel) {
                            *count = count.saturating_sub(1);
                        }
                    }
                    replies.push(array(vec![
                        bulk("unsubscribe"),
                        RespValue::BulkString(channel),
                        RespValue::Integer(self.channels.len() as i64),
                    ]));
                }
                Action::Reply(replies)
            }
            "MOCK.DROP" => Action::Close(None),
            "MOCK.SLEEP" if args.len() == 1 => {
                let millis = number(&args[0]).unwrap_or(0).max(0) as u64;
                Action::Delayed(Duration::from_millis(millis), ok())
            }
            "ECHO" | "SELECT" | "SET" | "GET" | "DEL" | "EXISTS" | "KEYS" | "EXPIRE"
            | "TTL" | "INCR" | "DECR" | "INCRBY" | "DECRBY" | "INCRBYFLOAT" | "HINCRBY"
            | "HINCRBYFLOAT" | "HSET" | "HGET" | "HGETALL"
            | "LPUSH" | "RPUSH" | "LRANGE" | "PUBLISH" | "SUBSCRIBE" | "MOCK.SLEEP" => {
                wrong_arity(&name)
            }
            _ => one(error(&format!(
                "ERR unknown command '{}'",
                name.to_lowercase()
            ))),
        }
    }

    fn auth(&mut self, shared: &Shared, args: &[Bytes]) -> Action {
        let (user, pass) = match args {
            [pass] => (None, text(pass)),
            [user, pass] => (Some(text(user)), text(pass)),
            _ => return wrong_arity("AUTH"),
        };

        let Some(ref expected) = shared.password else {
            return one(error(
                "ERR AUTH <password> called without any password configured for the default user",
            ));
        };

        let user_ok = match (&user, &shared.username) {
            (Some(given), Some(required)) => given == required,
            (None, Some(_)) => false,
            (Some(given), None) => given == "default",
            (None, None) => true,
        };

        if user_ok && pass == *expected {
            self.authed = true;
            one(ok())
        } else {
            one(error(
                "WRONGPASS invalid username-password pair or user is disabled.",
            ))
        }
    }

    fn set(&mut self, shared: &Shared, args: &[Bytes]) -> Action {
        let mut ttl = None;
        let mut nx = false;
        let mut xx = false;
        let mut i = 2;
        while i < args.len() {
            match text(&args[i]).to_ascii_uppercase().as_str() {
                "NX" => nx = true,
                "XX" => xx = true,
                "EX" | "PX" => {
                    let unit = text(&args[i]).to_ascii_uppercase();
                    let Some(value) = args.get(i + 1).and_then(number) else {
                        return one(error("ERR syntax error"));
                    };
                    ttl = Some(if unit == "EX" { value } else { value / 1000 });
                    i += 1;
                }
                _ => return one(error("ERR syntax error")),
            }
            i += 1;
        }
        if nx && xx {
            return one(error("ERR syntax error"));
        }

        let mut keys = shared.keys.lock();
        let key = (self.db, args[0].clone());
        let exists = keys.contains_key(&key);
        if (nx && exists) || (xx && !exists) {
            return one(RespValue::Null);
        }
        keys.insert(
            key,
            Stored {
                entry: Entry::Str(args[1].clone()),
                ttl,
            },
        );
        one(ok())
    }

    fn incr(&mut self, shared: &Shared, key: &Bytes, delta: i64) -> Action {
        let mut keys = shared.keys.lock();
        let key = (self.db, key.clone());
        let current = match keys.get(&key) {
            None => 0,
            Some(Stored {
                entry: Entry::Str(v),
                ..
            }) => match number(v) {
                Some(n) => n,
                None => return one(error("ERR value is not an integer or out of range")),
            },
            Some(_) => return wrong_type(),
        };
        let next = current + delta;
        let ttl = keys.get(&key).and_then(|s| s.ttl);
        keys.insert(
            key,
            Stored {
                entry: Entry::Str(Bytes::from(next.to_string())),
                ttl,
            },
        );
        one(RespValue::Integer(next))
    }

    fn incr_float(&mut self, shared: &Shared, key: &Bytes, delta: f64) -> Action {
        let mut keys = shared.keys.lock();
        let stored = keys.entry((self.db, key.clone())).or_insert(Stored {
            entry: Entry::Str(Bytes::from_static(b"0")),
            ttl: None,
        });
        let Entry::Str(value) = &mut stored.entry else {
            return wrong_type();
        };
        let Some(current) = float(value) else {
            return one(error("ERR value is not a valid float"));
        };
        let next = (current + delta).to_string();
        *value = Bytes::from(next.clone());
        one(bulk(&next))
    }

    // Applies `step` to a hash field (missing fields start at "0") and
    // stores the reply's text as the new value.
    fn hincr(
        &mut self,
        shared: &Shared,
        args: &[Bytes],
        step: impl Fn(&Bytes) -> Option<RespValue>,
    ) -> Action {
        let mut keys = shared.keys.lock();
        let stored = keys.entry((self.db, args[0].clone())).or_insert(Stored {
            entry: Entry::Hash(Vec::new()),
            ttl: None,
        });
        let Entry::Hash(fields) = &mut stored.entry else {
            return wrong_type();
        };
        let position = match fields.iter().position(|(f, _)| *f == args[1]) {
            Some(position) => position,
            None => {
                fields.push((args[1].clone(), Bytes::from_static(b"0")));
                fields.len() - 1
            }
        };
        let Some(reply) = step(&fields[position].1) else {
            return one(error("ERR hash value is not a number"));
        };
        fields[position].1 = match &reply {
            RespValue::Integer(n) => Bytes::from(n.to_string()),
            RespValue::BulkString(b) => b.clone(),
            _ => return one(error("ERR hash value is not a number")),
        };
        one(reply)
    }
}
