//! Basic usage of redis-keeper against a local server
//!
//! Run with `cargo run --example basic_usage` while a server listens on
//! localhost:6379.

use redis_keeper::{args, PoolConfig, Registry, SetOptions};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redis_keeper=debug".into()),
        )
        .init();

    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
    let registry = Registry::new();
    registry.set_default_config(
        redis_keeper::Configuration::from_url(&url)?
            .with_pool(PoolConfig::default().with_max_active(8)),
    );
    registry.set_config(redis_keeper::Configuration::from_url(&url)?.with_database(1), "cache");

    let client = registry.default_instance().ok_or("default group missing")?;
    println!("PING -> {}", client.ping().await?);

    client.set("example:key", "Hello, redis-keeper!").await?;
    println!("GET -> {:?}", client.get("example:key").await?);

    client.set("example:counter", 0).await?;
    println!("INCR -> {}", client.incr("example:counter").await?);
    println!("DECRBY 5 -> {}", client.decr_by("example:counter", 5).await?);

    let written = client
        .set_with_options(
            "example:temp",
            "short lived",
            &SetOptions::new().expire(Duration::from_secs(5)).nx(),
        )
        .await?;
    println!("SET NX EX -> {}, TTL {}", written, client.ttl("example:temp").await?);

    client.hset("example:user", "name", "Ada").await?;
    client.hset("example:user", "lang", "rust").await?;
    println!("HGETALL -> {:?}", client.hgetall("example:user").await?);

    client.rpush("example:list", ["a", "b", "c"]).await?;
    println!("LRANGE -> {:?}", client.lrange("example:list", 0, -1).await?);

    // Anything without a wrapper goes through execute
    let len = client.execute_view("STRLEN", &args!["example:key"]).await?.as_i64()?;
    println!("STRLEN -> {}", len);

    // Concurrent callers share the pool
    let mut tasks = Vec::new();
    for i in 0..5 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client.set(format!("example:task:{}", i), i).await
        }));
    }
    for task in tasks {
        task.await??;
    }
    println!("pool after tasks: {:?}", client.stats());

    let cache = registry.instance("cache").ok_or("cache group missing")?;
    cache.set("example:cached", "db 1").await?;
    println!("cache GET -> {:?}", cache.get("example:cached").await?);

    client
        .del([
            "example:key",
            "example:counter",
            "example:temp",
            "example:user",
            "example:list",
        ])
        .await?;
    cache.del(["example:cached"]).await?;

    registry.clear_config();
    Ok(())
}
