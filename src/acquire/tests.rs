use super::{find_session_cookie, Acquisition, PollOutcome, TokenAcquirer};
use crate::browser::{BrowserDriver, Cookie};
use crate::config::{CaptureConfig, OutputConfig};
use crate::error::{Result, RtokenError};
use crate::output::OutputWriter;
use crate::store::SaveOutcome;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

const COOKIE: &str = "SessionCookie";
const HOME: &str = "https://app.example.com/";
const SETTINGS: &str = "https://app.example.com/settings";
const LOGIN: &str = "https://auth.example.com/login";

/// What the fake browser shows during one poll.
#[derive(Clone)]
struct Step {
    cookies: std::result::Result<Vec<Cookie>, String>,
    url: String,
    map: HashMap<String, String>,
}

impl Step {
    fn pending() -> Self {
        Self {
            cookies: Ok(vec![Cookie::new("other", "value")]),
            url: LOGIN.to_string(),
            map: HashMap::new(),
        }
    }

    fn with_cookie(value: &str) -> Self {
        Self {
            cookies: Ok(vec![Cookie::new("other", "x"), Cookie::new(COOKIE, value)]),
            ..Self::pending()
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            cookies: Err(message.to_string()),
            ..Self::pending()
        }
    }

    fn at(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    fn mapped(mut self, value: &str) -> Self {
        self.map.insert(COOKIE.to_string(), value.to_string());
        self
    }
}

/// Scripted browser: poll `n` sees `steps[n]`, the last step repeats.
struct FakeBrowser {
    steps: Vec<Step>,
    dies_after: Option<usize>,
    fail_open: bool,
    polls: AtomicUsize,
    map_reads: AtomicUsize,
    quits: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

impl FakeBrowser {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            dies_after: None,
            fail_open: false,
            polls: AtomicUsize::new(0),
            map_reads: AtomicUsize::new(0),
            quits: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        }
    }

    fn dying_after(mut self, polls: usize) -> Self {
        self.dies_after = Some(polls);
        self
    }

    fn step(&self, index: usize) -> &Step {
        &self.steps[index.min(self.steps.len() - 1)]
    }

    fn current_step(&self) -> &Step {
        self.step(self.polls.load(Ordering::SeqCst).saturating_sub(1))
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn open_tab(&mut self, url: &str) -> Result<()> {
        if self.fail_open {
            return Err(RtokenError::Browser("tab refused".to_string()));
        }
        self.opened.lock().expect("lock").push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current_step().url.clone())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let index = self.polls.fetch_add(1, Ordering::SeqCst);
        self.step(index)
            .cookies
            .clone()
            .map_err(RtokenError::Browser)
    }

    async fn cookie_map(&self) -> Result<HashMap<String, String>> {
        self.map_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.current_step().map.clone())
    }

    async fn is_alive(&self) -> bool {
        let dead = self.dies_after.is_some_and(|limit| self.polls() >= limit);
        !dead && self.quits() == 0
    }

    async fn quit(&mut self) -> Result<()> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config(store: &Path) -> CaptureConfig {
    CaptureConfig {
        login_url: LOGIN.to_string(),
        home_url: HOME.to_string(),
        settings_url_prefix: SETTINGS.to_string(),
        cookie_name: COOKIE.to_string(),
        timeout: Duration::from_millis(5),
        poll_interval: Duration::from_millis(1),
        grace_period: Duration::ZERO,
        progress_every: 2,
        store_path: store.join("token.txt"),
        ..CaptureConfig::default()
    }
}

fn acquirer(config: CaptureConfig) -> TokenAcquirer {
    let output = OutputWriter::new(OutputConfig {
        silent: true,
        ..OutputConfig::default()
    });
    TokenAcquirer::new(config, output)
}

#[tokio::test]
async fn times_out_after_exactly_the_poll_budget() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::pending()]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    assert_eq!(outcome, Acquisition::TimedOut { polls: 5 });
    assert_eq!(browser.polls(), 5);
    assert_eq!(browser.quits(), 1);
    assert_eq!(*browser.opened.lock().expect("lock"), vec![LOGIN.to_string()]);
    assert!(!temp.path().join("token.txt").exists());
}

#[tokio::test]
async fn progress_is_reported_every_nth_poll() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::pending()]);

    acquirer.acquire(&mut browser).await.expect("acquire");

    assert_eq!(acquirer.progress_reports(), 2);
}

#[tokio::test]
async fn progress_is_silent_when_cadence_exceeds_budget() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(CaptureConfig {
        progress_every: 7,
        ..config(temp.path())
    });
    let mut browser = FakeBrowser::new(vec![Step::pending()]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    assert_eq!(outcome, Acquisition::TimedOut { polls: 5 });
    assert_eq!(acquirer.progress_reports(), 0);
}

#[tokio::test]
async fn progress_stops_once_the_token_is_found() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![
        Step::pending(),
        Step::pending(),
        Step::pending(),
        Step::with_cookie("tok-4"),
    ]);

    acquirer.acquire(&mut browser).await.expect("acquire");

    assert_eq!(acquirer.progress_reports(), 1);
}

#[tokio::test]
async fn stops_on_the_poll_where_the_cookie_appears() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![
        Step::pending(),
        Step::pending().at(HOME),
        Step::with_cookie("tok-3").at("https://elsewhere.example.com/"),
        Step::with_cookie("never-reached"),
    ]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    match outcome {
        Acquisition::Acquired { token, polls, saved } => {
            assert_eq!(token.as_str(), "tok-3");
            assert_eq!(polls, 3);
            assert_eq!(saved, SaveOutcome::Added { total: 1 });
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(browser.polls(), 3);
    assert_eq!(browser.quits(), 1);
    let stored = fs::read_to_string(temp.path().join("token.txt")).expect("store");
    assert_eq!(stored, "tok-3");
}

#[tokio::test]
async fn empty_cookie_falls_through_to_url_check() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::with_cookie("").at(HOME).mapped("from-map")]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    match outcome {
        Acquisition::Acquired { token, polls, .. } => {
            assert_eq!(token.as_str(), "from-map");
            assert_eq!(polls, 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(browser.map_reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn settings_prefix_triggers_map_lookup() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![
        Step::pending(),
        Step::pending().at("https://app.example.com/settings/account").mapped("tok"),
    ]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    assert!(matches!(outcome, Acquisition::Acquired { polls: 2, .. }));
}

#[tokio::test]
async fn other_urls_never_consult_the_cookie_map() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser =
        FakeBrowser::new(vec![Step::pending().at("https://app.example.com/pricing").mapped("tok")]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    assert_eq!(outcome, Acquisition::TimedOut { polls: 5 });
    assert_eq!(browser.map_reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_map_value_is_not_a_token() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::pending().at(HOME).mapped("")]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    assert_eq!(outcome, Acquisition::TimedOut { polls: 5 });
}

#[tokio::test]
async fn dead_browser_ends_the_run_immediately() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::pending()]).dying_after(2);

    let err = acquirer.acquire(&mut browser).await.expect_err("closed");

    assert!(matches!(err, RtokenError::BrowserClosed));
    assert_eq!(browser.polls(), 2);
    assert_eq!(browser.quits(), 1);
}

#[tokio::test]
async fn poll_error_on_a_dead_browser_is_fatal() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::failing("target closed")]).dying_after(1);

    let err = acquirer.acquire(&mut browser).await.expect_err("closed");

    assert!(matches!(err, RtokenError::BrowserClosed));
    assert_eq!(browser.polls(), 1);
    assert_eq!(browser.quits(), 1);
}

#[tokio::test]
async fn transient_poll_errors_keep_polling() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![
        Step::failing("navigation in progress"),
        Step::failing("navigation in progress"),
        Step::with_cookie("tok"),
    ]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    assert!(matches!(outcome, Acquisition::Acquired { polls: 3, .. }));
}

#[tokio::test]
async fn transient_errors_still_count_against_the_budget() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::failing("flaky")]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    assert_eq!(outcome, Acquisition::TimedOut { polls: 5 });
}

#[tokio::test]
async fn already_stored_token_is_reported_without_rewrite() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("token.txt");
    fs::write(&store, "a, tok ,b").expect("seed store");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::with_cookie("tok")]);

    let outcome = acquirer.acquire(&mut browser).await.expect("acquire");

    match outcome {
        Acquisition::Acquired { saved, .. } => {
            assert_eq!(saved, SaveOutcome::AlreadyPresent { total: 3 })
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(fs::read_to_string(&store).expect("read"), "a, tok ,b");
}

#[tokio::test]
async fn store_failure_is_returned_and_browser_still_closed() {
    let temp = tempdir().expect("tempdir");
    let mut config = config(temp.path());
    // A directory where the store file should be.
    config.store_path = temp.path().to_path_buf();
    let acquirer = acquirer(config);
    let mut browser = FakeBrowser::new(vec![Step::with_cookie("tok")]);

    let err = acquirer.acquire(&mut browser).await.expect_err("store error");

    assert!(matches!(err, RtokenError::Store(_)));
    assert_eq!(browser.quits(), 1);
}

#[tokio::test]
async fn open_failure_still_terminates_browser() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));
    let mut browser = FakeBrowser::new(vec![Step::pending()]);
    browser.fail_open = true;

    let err = acquirer.acquire(&mut browser).await.expect_err("open error");

    assert!(matches!(err, RtokenError::Browser(_)));
    assert_eq!(browser.polls(), 0);
    assert_eq!(browser.quits(), 1);
}

#[tokio::test]
async fn poll_once_classifies_outcomes() {
    let temp = tempdir().expect("tempdir");
    let acquirer = acquirer(config(temp.path()));

    let browser = FakeBrowser::new(vec![Step::pending()]);
    assert!(matches!(acquirer.poll_once(&browser).await, PollOutcome::Pending));

    let browser = FakeBrowser::new(vec![Step::failing("flaky")]);
    assert!(matches!(
        acquirer.poll_once(&browser).await,
        PollOutcome::Recoverable(RtokenError::Browser(_))
    ));

    let browser = FakeBrowser::new(vec![Step::pending()]).dying_after(0);
    assert!(matches!(
        acquirer.poll_once(&browser).await,
        PollOutcome::Fatal(RtokenError::BrowserClosed)
    ));
}

#[test]
fn find_session_cookie_skips_empty_duplicates() {
    let cookies = vec![
        Cookie::new(COOKIE, ""),
        Cookie::new("unrelated", "zzz"),
        Cookie::new(COOKIE, "second"),
    ];
    let token = find_session_cookie(&cookies, COOKIE).expect("token");
    assert_eq!(token.as_str(), "second");
    assert!(find_session_cookie(&cookies[..2], COOKIE).is_none());
}
