//! Ops alerting for rate-limit pressure.
//!
//! The watcher feeds every sweep's rate-limit snapshot through
//! [`AlertNotifier::check_and_notify`], which posts a JSON payload to
//! the configured webhook whenever a service *escalates* into danger or
//! critical. Repeats at the same severity stay quiet; once a service
//! drops back down, the next escalation alerts again.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::rate_limit::{RateLimit, Severity};
use crate::services::classify::rate_limit_severity;

/// Error type for webhook alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Webhook body for one escalation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlertPayload {
    pub service: String,
    pub severity: Severity,
    pub quota_percentage: f64,
    pub title: &'static str,
    pub message: &'static str,
}

/// Banner copy for alert-worthy severities. Warning and safe never
/// produce an alert.
pub fn alert_copy(severity: Severity) -> Option<(&'static str, &'static str)> {
    match severity {
        Severity::Critical => Some((
            "Critical Limit Reached!",
            "API quota is exhausted. New jobs will be queued until quota resets.",
        )),
        Severity::Danger => Some((
            "Approaching Limit",
            "Consider queueing non-urgent jobs to avoid hitting the limit.",
        )),
        Severity::Warning | Severity::Safe => None,
    }
}

/// An alert fires only on escalation: the severity must be danger or
/// worse and strictly above the last severity recorded for the service.
pub fn should_alert(previous: Option<Severity>, current: Severity) -> bool {
    if current < Severity::Danger {
        return false;
    }
    previous.is_none_or(|prev| current > prev)
}

/// Posts escalation alerts to an ops webhook, deduplicating per service.
///
/// The severity cache lives on the instance; two notifiers never share
/// state.
pub struct AlertNotifier {
    http: reqwest::Client,
    webhook_url: String,
    last_severity: HashMap<String, Severity>,
}

impl AlertNotifier {
    pub fn new(webhook_url: String) -> Result<Self, AlertError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            webhook_url,
            last_severity: HashMap::new(),
        })
    }

    /// Evaluates a sweep's snapshots and posts one webhook call per
    /// escalated service. Returns how many alerts were sent.
    ///
    /// A failed delivery leaves the service's recorded severity
    /// untouched, so the next sweep retries the same escalation.
    pub async fn check_and_notify(&mut self, limits: &[RateLimit]) -> Result<usize, AlertError> {
        let mut sent = 0;
        for limit in limits {
            let severity = rate_limit_severity(limit.quota_percentage);
            let previous = self.last_severity.get(&limit.api_service).copied();

            if should_alert(previous, severity) {
                // alert_copy is Some for every severity should_alert accepts
                if let Some((title, message)) = alert_copy(severity) {
                    let payload = AlertPayload {
                        service: limit.api_service.clone(),
                        severity,
                        quota_percentage: limit.quota_percentage,
                        title,
                        message,
                    };
                    self.http
                        .post(&self.webhook_url)
                        .json(&payload)
                        .send()
                        .await?
                        .error_for_status()?;
                    sent += 1;
                }
            }
            self.last_severity.insert(limit.api_service.clone(), severity);
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alerts_fire_only_from_danger_up() {
        assert!(!should_alert(None, Severity::Safe));
        assert!(!should_alert(None, Severity::Warning));
        assert!(should_alert(None, Severity::Danger));
        assert!(should_alert(None, Severity::Critical));
    }

    #[test]
    fn test_repeat_severity_stays_quiet() {
        assert!(!should_alert(Some(Severity::Danger), Severity::Danger));
        assert!(!should_alert(Some(Severity::Critical), Severity::Critical));
        assert!(should_alert(Some(Severity::Danger), Severity::Critical));
    }

    #[test]
    fn test_deescalation_rearms_the_alert() {
        // Critical, back to safe, critical again: the middle sweep
        // records the drop, so the third sweep alerts.
        assert!(should_alert(None, Severity::Critical));
        assert!(!should_alert(Some(Severity::Critical), Severity::Safe));
        assert!(should_alert(Some(Severity::Safe), Severity::Critical));
    }

    #[test]
    fn test_copy_matches_severity() {
        let (title, message) = alert_copy(Severity::Critical).unwrap();
        assert_eq!(title, "Critical Limit Reached!");
        assert!(message.contains("quota is exhausted"));

        let (title, message) = alert_copy(Severity::Danger).unwrap();
        assert_eq!(title, "Approaching Limit");
        assert!(message.contains("non-urgent"));

        assert!(alert_copy(Severity::Warning).is_none());
        assert!(alert_copy(Severity::Safe).is_none());
    }
}
