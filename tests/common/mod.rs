use chanharvest::{CatalogClient, ChannelRecord, ChannelStats, HarvestOptions, RemoteError, SearchPage};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// One observed call against the scripted catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Search { key: String, query: String, token: Option<String> },
    Stats { key: String, ids: Vec<String> },
}

/// In-memory `CatalogClient` driven by a script:
/// - `pages`: (query, token) -> page
/// - `stats`: id -> stats (ids without an entry are absent from lookups)
/// - `failures`: errors returned, in order, by the next calls (any kind)
/// - `quota_keys`: keys that always answer QuotaExceeded
/// - `broken_queries`: queries whose search always fails with Other
/// - `endless`: generate `per_page` fresh ids per page forever, all with `subs` subscribers
#[derive(Default)]
pub struct ScriptedCatalog {
    pages: HashMap<(String, Option<String>), SearchPage>,
    stats: HashMap<String, ChannelStats>,
    failures: RefCell<VecDeque<RemoteError>>,
    quota_keys: HashSet<String>,
    broken_queries: HashSet<String>,
    endless: Option<(usize, u64)>,
    log: RefCell<Vec<Call>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endless(per_page: usize, subs: u64) -> Self {
        Self { endless: Some((per_page, subs)), ..Self::default() }
    }

    /// Register a page for `query` at `token` listing `ids`, pointing at `next`.
    pub fn page(mut self, query: &str, token: Option<&str>, ids: &[&str], next: Option<&str>) -> Self {
        self.pages.insert(
            (query.to_string(), token.map(String::from)),
            SearchPage {
                channel_ids: ids.iter().map(|s| s.to_string()).collect(),
                next_page_token: next.map(String::from),
            },
        );
        self
    }

    pub fn channel(mut self, id: &str, subs: u64) -> Self {
        self.stats.insert(id.to_string(), stats(id, subs));
        self
    }

    pub fn fail_next(self, err: RemoteError) -> Self {
        self.failures.borrow_mut().push_back(err);
        self
    }

    pub fn quota_key(mut self, key: &str) -> Self {
        self.quota_keys.insert(key.to_string());
        self
    }

    pub fn broken_query(mut self, query: &str) -> Self {
        self.broken_queries.insert(query.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn search_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| matches!(c, Call::Search { .. })).collect()
    }

    pub fn keys_used(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| match c {
                Call::Search { key, .. } | Call::Stats { key, .. } => key,
            })
            .collect()
    }

    fn scripted_failure(&self, key: &str) -> Option<RemoteError> {
        if let Some(err) = self.failures.borrow_mut().pop_front() {
            return Some(err);
        }
        if self.quota_keys.contains(key) {
            return Some(RemoteError::QuotaExceeded(format!("key {key} exhausted")));
        }
        None
    }
}

impl CatalogClient for ScriptedCatalog {
    fn search_channels(
        &self,
        credential: &str,
        query: &str,
        page_token: Option<&str>,
        _page_size: u32,
    ) -> Result<SearchPage, RemoteError> {
        self.log.borrow_mut().push(Call::Search {
            key: credential.to_string(),
            query: query.to_string(),
            token: page_token.map(String::from),
        });
        if let Some(err) = self.scripted_failure(credential) {
            return Err(err);
        }
        if self.broken_queries.contains(query) {
            return Err(RemoteError::Other("backend unavailable".into()));
        }
        if let Some((per_page, _)) = self.endless {
            let n: usize = page_token
                .and_then(|t| t.strip_prefix('p'))
                .and_then(|t| t.parse().ok())
                .unwrap_or(0);
            return Ok(SearchPage {
                channel_ids: (0..per_page).map(|i| format!("{query}-{n}-{i}")).collect(),
                next_page_token: Some(format!("p{}", n + 1)),
            });
        }
        Ok(self
            .pages
            .get(&(query.to_string(), page_token.map(String::from)))
            .cloned()
            .unwrap_or_default())
    }

    fn channel_stats(&self, credential: &str, ids: &[String]) -> Result<Vec<ChannelStats>, RemoteError> {
        self.log.borrow_mut().push(Call::Stats { key: credential.to_string(), ids: ids.to_vec() });
        if let Some(err) = self.scripted_failure(credential) {
            return Err(err);
        }
        Ok(ids
            .iter()
            .filter_map(|id| match (self.stats.get(id), self.endless) {
                (Some(s), _) => Some(s.clone()),
                (None, Some((_, subs))) => Some(stats(id, subs)),
                (None, None) => None,
            })
            .collect())
    }
}

pub fn stats(id: &str, subs: u64) -> ChannelStats {
    ChannelStats {
        channel_id: id.to_string(),
        title: format!("Channel {id}"),
        description: format!("About {id}"),
        published_at: "2015-03-01T12:00:00Z".to_string(),
        subscriber_count: subs,
        view_count: subs * 40,
        video_count: 120,
    }
}

pub fn record(id: &str, subs: u64, query: &str) -> ChannelRecord {
    ChannelRecord::from_stats(stats(id, subs), query)
}

/// Options for tests: one key, one query "x", no sleeping, no progress bar, output under `dir`.
pub fn test_opts(dir: &Path) -> HarvestOptions {
    HarvestOptions::default()
        .with_credentials(["k1"])
        .with_queries(["x"])
        .with_output(dir.join("channels.csv"))
        .with_backoff(Duration::ZERO, Duration::ZERO)
        .with_progress(false)
}

/// Minimal HTTP/1.1 responder: serves `responses` (status, body) in order, one per
/// connection, and records each request line (method + path + query).
pub fn serve_canned(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<String>>>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_srv = Arc::clone(&seen);
    let handle = std::thread::spawn(move || {
        for (status, body) in responses {
            let (mut sock, _) = listener.accept().unwrap();
            sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            let mut head = Vec::new();
            let mut byte = [0u8; 1];
            while !head.ends_with(b"\r\n\r\n") {
                if sock.read(&mut byte).unwrap() == 0 {
                    break;
                }
                head.push(byte[0]);
            }
            let head = String::from_utf8_lossy(&head).to_string();
            let request_line = head.lines().next().unwrap_or("").to_string();
            seen_srv.lock().unwrap().push(request_line);
            let resp = format!(
                "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).unwrap();
            sock.flush().unwrap();
        }
    });
    (base, seen, handle)
}
