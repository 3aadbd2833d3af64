use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use memsweep::config::Config;
use memsweep::format::{
    progress_bar, render_cleanup_report, render_reclaim_report, render_snapshot,
};
use memsweep::system::platform;
use memsweep::system::reclaim::ReclaimEngine;
use memsweep::system::sampler::MetricsSampler;
use memsweep::system::snapshot::SystemSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Elevated,
    Limited,
    Relaunched,
}

/// In-progress flag for long operations. Held for the length of a run;
/// a second run is refused while it is held.
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl RunGuard {
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { flag: flag.clone() })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct App {
    config: Config,
    json: bool,
    sampler: Option<MetricsSampler>,
    busy: Arc<AtomicBool>,
}

impl App {
    pub fn new(config: Config, json: bool) -> Self {
        App {
            config,
            json,
            sampler: None,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Relaunch elevated when configured to; otherwise warn and carry on with
    /// whatever the current privileges allow.
    pub fn check_privileges(&self) -> Result<Privilege> {
        if platform::is_elevated() {
            return Ok(Privilege::Elevated);
        }
        if self.config.general.elevate {
            platform::relaunch_elevated()
                .wrap_err("failed to restart with administrator privileges")?;
            tracing::info!("relaunched with elevated privileges");
            return Ok(Privilege::Relaunched);
        }
        tracing::warn!(
            "not running elevated; protected processes and files will be skipped"
        );
        Ok(Privilege::Limited)
    }

    pub async fn status(&mut self) -> Result<()> {
        let snapshot = self.sample().await?;
        self.print_snapshot(&snapshot)
    }

    /// Poll the sampler every refresh interval until `count` readings were
    /// printed or Ctrl-C arrives.
    pub async fn watch(&mut self, count: Option<u64>) -> Result<()> {
        let period = Duration::from_millis(self.config.general.refresh_rate_ms());
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut printed = 0u64;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = self.sample().await?;
                    if printed > 0 && !self.json {
                        println!();
                    }
                    self.print_snapshot(&snapshot)?;
                    printed += 1;
                    if count.is_some_and(|limit| printed >= limit) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok(())
    }

    pub async fn clean_temp(&mut self) -> Result<()> {
        let mut engine = ReclaimEngine::new();
        if let Some(dir) = self.config.cleanup.scratch_dir.clone() {
            engine = engine.with_scratch_dir(dir);
        }
        let scratch: PathBuf = engine.scratch_dir();
        tracing::info!(dir = %scratch.display(), "cleaning temporary files");

        let report = self
            .run_with_progress("Cleaning temporary files", move |progress| {
                engine.clean_temporary_files(progress)
            })
            .await?;

        if self.json {
            return print_json(&report);
        }
        println!("{}", render_cleanup_report(&report));
        Ok(())
    }

    pub async fn free_memory(&mut self) -> Result<()> {
        let mut engine = ReclaimEngine::new();
        let report = self
            .run_with_progress("Freeing RAM", move |progress| engine.free_memory(progress))
            .await
            .wrap_err("error freeing RAM")?;

        if self.json {
            return print_json(&report);
        }
        println!("{}", render_reclaim_report(&report));
        Ok(())
    }

    /// Take one reading on a blocking thread. The sampler moves to the worker
    /// and back, so only one query is ever in flight.
    async fn sample(&mut self) -> Result<SystemSnapshot> {
        let mut sampler = self.sampler.take().unwrap_or_default();
        let volume = self.config.general.volume();
        let (sampler, snapshot) = tokio::task::spawn_blocking(move || {
            let snapshot = sampler.snapshot(&volume);
            tracing::debug!(raw_cpu = ?sampler.last_cpu_reading(), "sampled");
            (sampler, snapshot)
        })
        .await?;
        self.sampler = Some(sampler);
        Ok(snapshot?)
    }

    fn print_snapshot(&self, snapshot: &SystemSnapshot) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(snapshot)?);
        } else {
            println!("{}", render_snapshot(snapshot));
        }
        Ok(())
    }

    /// Run `op` on a blocking worker and draw its progress here as it
    /// arrives. The worker only ever sees a callback that feeds the channel.
    async fn run_with_progress<R, E, F>(&self, label: &str, op: F) -> Result<R>
    where
        R: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: FnOnce(&mut dyn FnMut(u8)) -> Result<R, E> + Send + 'static,
    {
        let _guard = RunGuard::acquire(&self.busy)
            .ok_or_else(|| eyre!("another run is already in progress"))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        let worker = tokio::task::spawn_blocking(move || {
            let mut send = |percent: u8| {
                let _ = tx.send(percent);
            };
            op(&mut send)
        });

        let mut drawn = false;
        while let Some(percent) = rx.recv().await {
            if !self.json {
                eprint!("\r{label}... {}", progress_bar(percent));
                drawn = true;
            }
        }
        if drawn {
            eprintln!();
        }

        Ok(worker.await??)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
