//! In-memory service doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use transx_models::{TranscriptionJobState, TranslationJobState};
use transx_storage::{sha256_base64, ObjectStore, StorageError, StorageResult};
use transx_worker::services::{
    IdentityService, TranscriptionJobRequest, TranscriptionJobStatus, TranscriptionService,
    TranslationJobDescription, TranslationJobRequest, TranslationService,
};
use transx_worker::{ServiceError, ServiceResult};

pub const ACCOUNT_ID: &str = "123456789012";

/// Bucket contents keyed by `(bucket, key)`.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    /// Checksums recorded by `put_object`; `insert` stores none.
    checksums: Mutex<HashMap<(String, String), String>>,
    buckets: Mutex<Vec<String>>,
    failing_puts: Mutex<HashSet<String>>,
    failing_gets: Mutex<HashMap<String, usize>>,
    cancel_on_put: Mutex<Option<CancellationToken>>,
    pub put_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub create_bucket_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_bucket(self: Arc<Self>, name: &str) -> Arc<Self> {
        self.buckets.lock().unwrap().push(name.to_string());
        self
    }

    /// Every upload of `key` fails.
    pub fn fail_put(&self, key: &str) {
        self.failing_puts.lock().unwrap().insert(key.to_string());
    }

    /// The next `times` reads of `key` fail, then reads succeed again.
    pub fn fail_get(&self, key: &str, times: usize) {
        self.failing_gets.lock().unwrap().insert(key.to_string(), times);
    }

    /// Cancel `token` after every successful upload.
    pub fn cancel_on_put(&self, token: CancellationToken) {
        *self.cancel_on_put.lock().unwrap() = Some(token);
    }

    pub fn insert(&self, bucket: &str, key: &str, bytes: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes.into());
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn keys_with_prefix(&self, bucket: &str, prefix: &str) -> Vec<String> {
        self.keys(bucket)
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }

    pub fn buckets(&self) -> Vec<String> {
        self.buckets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_puts.lock().unwrap().contains(key) {
            return Err(StorageError::upload_failed(format!("injected failure for {}", key)));
        }
        let bytes = tokio::fs::read(path).await?;
        self.checksums.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            sha256_base64(&bytes),
        );
        self.insert(bucket, key, bytes);
        if let Some(token) = self.cancel_on_put.lock().unwrap().as_ref() {
            token.cancel();
        }
        Ok(())
    }

    async fn object_checksum(&self, bucket: &str, key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .checksums
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut failing = self.failing_gets.lock().unwrap();
            if let Some(remaining) = failing.get_mut(key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StorageError::download_failed(format!(
                        "injected failure for {}",
                        key
                    )));
                }
            }
        }
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self.keys_with_prefix(bucket, prefix))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let id = (bucket.to_string(), key.to_string());
        self.checksums.lock().unwrap().remove(&id);
        self.objects.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        Ok(self.buckets())
    }

    async fn create_bucket(&self, name: &str) -> StorageResult<()> {
        self.create_bucket_calls.fetch_add(1, Ordering::SeqCst);
        self.buckets.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        if !self.keys(name).is_empty() {
            return Err(StorageError::delete_failed(format!("bucket {} is not empty", name)));
        }
        let mut buckets = self.buckets.lock().unwrap();
        let before = buckets.len();
        buckets.retain(|b| b != name);
        if buckets.len() == before {
            return Err(StorageError::not_found(name));
        }
        Ok(())
    }
}

/// Speech-to-text double.
///
/// Each job walks through a scripted list of states chosen by the uploaded
/// key; the last state repeats. A completed job writes its subtitle into
/// the store the way the real service does.
pub struct FakeTranscribe {
    store: Arc<MemoryStore>,
    scripts: Mutex<HashMap<String, Vec<TranscriptionJobState>>>,
    jobs: Mutex<HashMap<String, (TranscriptionJobRequest, VecDeque<TranscriptionJobState>)>>,
    cancel_on_completed: Mutex<Option<CancellationToken>>,
    pub requests: Mutex<Vec<TranscriptionJobRequest>>,
    pub status_calls: AtomicUsize,
}

impl FakeTranscribe {
    pub fn new(store: Arc<MemoryStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            scripts: Mutex::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
            cancel_on_completed: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
        })
    }

    /// Cancel `token` whenever a job reports `Completed`.
    pub fn cancel_on_completed(&self, token: CancellationToken) {
        *self.cancel_on_completed.lock().unwrap() = Some(token);
    }

    /// States reported for the job that transcribes `remote_key`.
    pub fn script(&self, remote_key: &str, states: Vec<TranscriptionJobState>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(remote_key.to_string(), states);
    }

    fn script_for(&self, media_uri: &str) -> VecDeque<TranscriptionJobState> {
        self.scripts
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| media_uri.ends_with(&format!("/{}", key)))
            .map(|(_, states)| states.iter().cloned().collect())
            .unwrap_or_else(|| VecDeque::from([TranscriptionJobState::Completed]))
    }
}

#[async_trait]
impl TranscriptionService for FakeTranscribe {
    async fn start_job(&self, request: &TranscriptionJobRequest) -> ServiceResult<()> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self.script_for(&request.media_uri);
        self.jobs
            .lock()
            .unwrap()
            .insert(request.job_name.clone(), (request.clone(), script));
        Ok(())
    }

    async fn job_status(&self, job_name: &str) -> ServiceResult<TranscriptionJobStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let (request, state) = {
            let mut jobs = self.jobs.lock().unwrap();
            let (request, script) = jobs
                .get_mut(job_name)
                .ok_or_else(|| ServiceError::transcription(format!("no job {}", job_name)))?;
            let state = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            };
            (request.clone(), state)
        };

        let completed = state == TranscriptionJobState::Completed;
        if completed {
            self.store.insert(
                &request.output_bucket,
                &format!("{}.{}", request.output_key, request.subtitle_format),
                "1\n00:00:01,000 --> 00:00:02,000\nHello from Quercus\n",
            );
            if let Some(token) = self.cancel_on_completed.lock().unwrap().as_ref() {
                token.cancel();
            }
        }
        let failure_reason = (state == TranscriptionJobState::Failed)
            .then(|| "Unsupported media format".to_string());
        Ok(TranscriptionJobStatus {
            state,
            failure_reason,
            language_codes: if completed {
                vec!["en-US".to_string()]
            } else {
                Vec::new()
            },
        })
    }
}

/// Translation double.
///
/// Completed jobs write one `{lang}.{file}` per target language into an
/// account-scoped folder under the requested output prefix, skipping any
/// language listed in `missing_languages`.
pub struct FakeTranslate {
    store: Arc<MemoryStore>,
    bucket: String,
    script: Mutex<Vec<TranslationJobState>>,
    job_scripts: Mutex<Vec<(String, Vec<TranslationJobState>)>>,
    jobs: Mutex<HashMap<String, (TranslationJobRequest, VecDeque<TranslationJobState>)>>,
    missing_languages: Mutex<HashSet<String>>,
    pub requests: Mutex<Vec<TranslationJobRequest>>,
    pub describe_calls: AtomicUsize,
}

impl FakeTranslate {
    pub fn new(store: Arc<MemoryStore>, bucket: &str) -> Arc<Self> {
        Arc::new(Self {
            store,
            bucket: bucket.to_string(),
            script: Mutex::new(vec![
                TranslationJobState::Submitted,
                TranslationJobState::InProgress,
                TranslationJobState::Completed,
            ]),
            job_scripts: Mutex::new(Vec::new()),
            jobs: Mutex::new(HashMap::new()),
            missing_languages: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
            describe_calls: AtomicUsize::new(0),
        })
    }

    /// States reported by every job started after this call.
    pub fn script(&self, states: Vec<TranslationJobState>) {
        *self.script.lock().unwrap() = states;
    }

    /// States reported by jobs whose name contains `fragment`, overriding
    /// the shared script.
    pub fn script_job(&self, fragment: &str, states: Vec<TranslationJobState>) {
        self.job_scripts
            .lock()
            .unwrap()
            .push((fragment.to_string(), states));
    }

    fn script_for(&self, job_name: &str) -> VecDeque<TranslationJobState> {
        self.job_scripts
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| job_name.contains(fragment.as_str()))
            .map(|(_, states)| states.iter().cloned().collect())
            .unwrap_or_else(|| self.script.lock().unwrap().iter().cloned().collect())
    }

    pub fn omit_language(&self, language: &str) {
        self.missing_languages
            .lock()
            .unwrap()
            .insert(language.to_lowercase());
    }

    fn output_prefix(&self, request: &TranslationJobRequest, job_id: &str) -> String {
        let base = request
            .output_uri
            .trim_start_matches(&format!("s3://{}/", self.bucket))
            .trim_end_matches('/');
        format!("{}/{}-TranslateText-{}", base, ACCOUNT_ID, job_id)
    }

    fn write_output(&self, request: &TranslationJobRequest, prefix: &str) {
        let input = request
            .input_uri
            .trim_start_matches(&format!("s3://{}/", self.bucket))
            .to_string();
        let missing = self.missing_languages.lock().unwrap().clone();
        for key in self.store.keys_with_prefix(&self.bucket, &input) {
            let Some(file) = key.rsplit('/').next() else {
                continue;
            };
            for language in &request.target_languages {
                let language = language.to_lowercase();
                if missing.contains(&language) {
                    continue;
                }
                self.store.insert(
                    &self.bucket,
                    &format!("{}/{}.{}", prefix, language, file),
                    format!("1\n00:00:01,000 --> 00:00:02,000\n[{}] Quercus\n", language),
                );
            }
        }
    }
}

#[async_trait]
impl TranslationService for FakeTranslate {
    async fn start_job(&self, request: &TranslationJobRequest) -> ServiceResult<String> {
        let job_id = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            format!("job-{}", requests.len())
        };
        let script = self.script_for(&request.job_name);
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.clone(), (request.clone(), script));
        Ok(job_id)
    }

    async fn describe_job(&self, job_id: &str) -> ServiceResult<TranslationJobDescription> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let (request, state) = {
            let mut jobs = self.jobs.lock().unwrap();
            let (request, script) = jobs
                .get_mut(job_id)
                .ok_or_else(|| ServiceError::translation(format!("no job {}", job_id)))?;
            let state = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            };
            (request.clone(), state)
        };

        let prefix = self.output_prefix(&request, job_id);
        let done = matches!(
            state,
            TranslationJobState::Completed | TranslationJobState::CompletedWithError
        );
        if done {
            self.write_output(&request, &prefix);
        }
        Ok(TranslationJobDescription {
            output_uri: done.then(|| format!("s3://{}/{}/", self.bucket, prefix)),
            message: (state == TranslationJobState::Failed)
                .then(|| "Access denied to output bucket".to_string()),
            state,
        })
    }
}

/// Role registry double.
#[derive(Default)]
pub struct FakeIdentity {
    roles: Mutex<HashMap<String, Vec<String>>>,
    pub created: AtomicUsize,
}

impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn policies(&self, role: &str) -> Vec<String> {
        self.roles
            .lock()
            .unwrap()
            .get(role)
            .cloned()
            .unwrap_or_default()
    }
}

fn role_arn(name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", ACCOUNT_ID, name)
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn get_role(&self, name: &str) -> ServiceResult<String> {
        if self.roles.lock().unwrap().contains_key(name) {
            Ok(role_arn(name))
        } else {
            Err(ServiceError::RoleNotFound(name.to_string()))
        }
    }

    async fn create_role(&self, name: &str, _trust_policy: &str) -> ServiceResult<String> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.roles
            .lock()
            .unwrap()
            .insert(name.to_string(), Vec::new());
        Ok(role_arn(name))
    }

    async fn attach_policy(&self, role_name: &str, policy_arn: &str) -> ServiceResult<()> {
        self.roles
            .lock()
            .unwrap()
            .get_mut(role_name)
            .ok_or_else(|| ServiceError::RoleNotFound(role_name.to_string()))?
            .push(policy_arn.to_string());
        Ok(())
    }
}

/// Write a small fake video under `dir`.
pub fn write_video(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    path
}
