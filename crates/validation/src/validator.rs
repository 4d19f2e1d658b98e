//! The validator contract and the runner that fans jobs out over a task
//! group and collects their results.

use crate::result::ManifestResult;
use opcheck_common::{Error, Result};
use opcheck_manifest_schema::Object;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// A deferred check over one object (or one group of objects).
pub type Job = Box<dyn FnOnce() -> Result<ManifestResult> + Send + 'static>;

/// A rule set. Given candidate objects, it returns one job per object it
/// understands and silently skips the rest.
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;

    fn jobs(&self, objs: &[Object]) -> Vec<Job>;
}

/// An ordered set of validators run together.
#[derive(Clone, Default)]
pub struct Validators(Vec<Arc<dyn Validator>>);

impl Validators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.push(validator);
        self
    }

    pub fn push(&mut self, validator: impl Validator + 'static) {
        self.0.push(Arc::new(validator));
    }

    /// Concatenate another set onto this one.
    pub fn extend(&mut self, other: Validators) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|v| v.name()).collect()
    }

    /// Every job every validator produces for `objs`.
    pub fn jobs(&self, objs: &[Object]) -> Vec<Job> {
        self.0
            .iter()
            .flat_map(|v| {
                let jobs = v.jobs(objs);
                debug!(validator = v.name(), jobs = jobs.len(), "Collected jobs");
                jobs
            })
            .collect()
    }

    /// Run every job and keep the results that carry at least one finding.
    ///
    /// A single job runs inline; more run concurrently on the blocking pool
    /// and are all awaited before returning. Result order is not stable
    /// across runs; see [`crate::sort_results`].
    pub async fn apply(&self, objs: &[Object]) -> Result<Vec<ManifestResult>> {
        let mut jobs = self.jobs(objs);
        let mut results = Vec::new();

        match jobs.len() {
            0 => {}
            1 => {
                let job = jobs.remove(0);
                keep_findings(&mut results, job()?);
            }
            n => {
                debug!("Running {} validation jobs", n);
                let mut set = JoinSet::new();
                for job in jobs {
                    set.spawn_blocking(job);
                }

                let mut failure = None;
                while let Some(joined) = set.join_next().await {
                    match joined {
                        Ok(Ok(result)) => keep_findings(&mut results, result),
                        Ok(Err(e)) => {
                            failure.get_or_insert(e);
                        }
                        Err(e) => {
                            failure.get_or_insert(Error::Task(e.to_string()));
                        }
                    }
                }
                if let Some(e) = failure {
                    return Err(e);
                }
            }
        }

        debug!(results = results.len(), "Validation finished");
        Ok(results)
    }
}

fn keep_findings(results: &mut Vec<ManifestResult>, result: ManifestResult) {
    if !result.is_empty() {
        results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ErrorKind, Issue};
    use opcheck_manifest_schema::PackageManifest;

    /// Flags every package, warning on clean ones.
    struct Echo {
        fail: bool,
    }

    impl Validator for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn jobs(&self, objs: &[Object]) -> Vec<Job> {
            objs.iter()
                .filter_map(|o| match o {
                    Object::Package(pkg) => Some(pkg.clone()),
                    _ => None,
                })
                .map(|pkg| {
                    let fail = self.fail;
                    Box::new(move || {
                        if fail {
                            return Err(Error::MissingDescriptor(pkg.package_name.clone()));
                        }
                        let mut result = ManifestResult::new(pkg.package_name.clone());
                        if pkg.package_name.starts_with("bad") {
                            result.add(Issue::warn(ErrorKind::InvalidPackageManifest, "bad"));
                        }
                        Ok(result)
                    }) as Job
                })
                .collect()
        }
    }

    fn package(name: &str) -> Object {
        Object::from(PackageManifest {
            package_name: name.into(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_apply_no_jobs() {
        let vals = Validators::new().with(Echo { fail: false });
        let results = vals.apply(&[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_apply_single_job_drops_clean_result() {
        let vals = Validators::new().with(Echo { fail: false });
        let results = vals.apply(&[package("good")]).await.unwrap();
        assert!(results.is_empty());

        let results = vals.apply(&[package("bad")]).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_many_jobs_keeps_findings() {
        let vals = Validators::new()
            .with(Echo { fail: false })
            .with(Echo { fail: false });
        let objs = vec![package("bad-a"), package("good"), package("bad-b")];

        let mut results = vals.apply(&objs).await.unwrap();
        crate::sort_results(&mut results);
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["bad-a", "bad-a", "bad-b", "bad-b"]);
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let vals = Validators::new().with(Echo { fail: false });
        let objs = vec![package("bad-a"), package("bad-b")];

        let mut first = vals.apply(&objs).await.unwrap();
        let mut second = vals.apply(&objs).await.unwrap();
        crate::sort_results(&mut first);
        crate::sort_results(&mut second);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_apply_propagates_job_failure() {
        let vals = Validators::new().with(Echo { fail: true });
        let err = vals
            .apply(&[package("a"), package("b")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingDescriptor(_)));
    }

    #[test]
    fn test_extend_concatenates() {
        let mut vals = Validators::new().with(Echo { fail: false });
        vals.extend(Validators::new().with(Echo { fail: true }));
        assert_eq!(vals.len(), 2);
        assert_eq!(vals.names(), vec!["echo", "echo"]);
    }
}
