use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "pl_home_advantage";
const INDEX_FILE: &str = "http_index.json";

static INDEX: Mutex<Option<CacheIndex>> = Mutex::new(None);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheIndex {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body_file: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// GET with conditional revalidation. Bodies are stored as raw bytes so
/// non-UTF-8 downloads survive untouched.
pub fn fetch_bytes_cached(client: &Client, url: &str) -> Result<Vec<u8>> {
    let cached = cached_entry(url).and_then(|entry| {
        let body = fs::read(body_path(&entry.body_file)?).ok()?;
        Some((entry, body))
    });

    let mut req = client.get(url);
    if let Some((entry, _)) = cached.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().with_context(|| format!("request {url} failed"))?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some((entry, body)) = cached {
            store_entry(url, entry, None);
            return Ok(body);
        }
        return Err(anyhow!("received 304 without cache body for {url}"));
    }

    let body = resp.bytes().context("failed reading body")?.to_vec();
    if !status.is_success() {
        return Err(anyhow!("http {status} for {url}"));
    }

    let header_str = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let entry = CacheEntry {
        body_file: body_file_name(url),
        etag: header_str(ETAG),
        last_modified: header_str(LAST_MODIFIED),
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    store_entry(url, entry, Some(&body));
    Ok(body)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn cached_entry(url: &str) -> Option<CacheEntry> {
    let mut guard = INDEX.lock().ok()?;
    let index = guard.get_or_insert_with(load_index);
    index.entries.get(url).cloned()
}

fn store_entry(url: &str, mut entry: CacheEntry, body: Option<&[u8]>) {
    if let Some(body) = body {
        let Some(path) = body_path(&entry.body_file) else {
            return;
        };
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        if fs::write(&path, body).is_err() {
            return;
        }
    } else {
        entry.fetched_at = system_time_to_secs(SystemTime::now()).unwrap_or(entry.fetched_at);
    }

    let Ok(mut guard) = INDEX.lock() else {
        return;
    };
    let index = guard.get_or_insert_with(load_index);
    index.version = CACHE_VERSION;
    index.entries.insert(url.to_string(), entry);
    let _ = save_index(index);
}

fn load_index() -> CacheIndex {
    let Some(path) = index_path() else {
        return CacheIndex::default();
    };
    let Ok(raw) = fs::read_to_string(path) else {
        return CacheIndex::default();
    };
    let index = serde_json::from_str::<CacheIndex>(&raw).unwrap_or_default();
    if index.version != CACHE_VERSION {
        return CacheIndex::default();
    }
    index
}

fn save_index(index: &CacheIndex) -> Result<()> {
    let Some(path) = index_path() else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).ok();
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(index).context("serialize http cache index")?;
    fs::write(&tmp, json).context("write http cache index")?;
    fs::rename(&tmp, &path).context("swap http cache index")?;
    Ok(())
}

fn index_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(INDEX_FILE))
}

fn body_path(file: &str) -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("bodies").join(file))
}

fn body_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{digest:x}.bin")
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
