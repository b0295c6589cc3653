use crate::dom::Document;

use super::{BindOutcome, BindTrigger, Coordinator, HealthReport, integrity};

impl Coordinator {
    /// One health monitor sweep.
    ///
    /// Runs on its own period and does not trust the watcher: any candidate that is not
    /// bound exactly once is broken, and broken elements trigger an immediate repair bind
    /// that bypasses both the watcher debounce and the guard window.
    pub fn run_health_check<D: Document + ?Sized>(&mut self, doc: &mut D) -> HealthReport {
        let pruned = self.registry.retain_live(doc);
        let (issues, broken) =
            integrity::binding_integrity_issues(doc, &self.options.selectors, &self.registry);
        self.debug_handle_integrity_result(&issues);

        let mut repaired = false;
        if broken > 0 && self.options.monitor_repair {
            log::info!("health monitor: {broken} broken element(s), repairing");
            repaired = matches!(
                self.bind_all_with(doc, BindTrigger::Repair),
                BindOutcome::Bound(_)
            );
            if repaired {
                self.stats.repairs += 1;
                self.debug_log_event(format!("monitor REPAIR broken={broken}"));
            }
        }

        HealthReport {
            issues,
            broken,
            pruned,
            repaired,
        }
    }

    /// Logs an issue set only when it differs from the previous sweep's.
    fn debug_handle_integrity_result(&mut self, issues: &[String]) {
        let hash = integrity::hash_issues(issues);
        let prev = self.last_integrity_hash.replace(hash);
        if prev == Some(hash) {
            return;
        }

        if issues.is_empty() {
            if prev.is_some() {
                self.debug_log_event("integrity OK");
            }
            return;
        }

        log::debug!("health monitor: {} issue(s)", issues.len());
        for line in issues {
            self.debug_log_event(line.clone());
        }
    }
}
