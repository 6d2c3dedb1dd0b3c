//! Identity Metrics
//!
//! 业务指标记录

use metrics::counter;

/// 记录注册成功
pub fn record_registration() {
    counter!("identity_registrations_total").increment(1);
}

/// 记录登录结果
pub fn record_login(outcome: &'static str) {
    counter!("identity_logins_total", "outcome" => outcome).increment(1);
}

/// 记录激活结果
pub fn record_activation(outcome: &'static str) {
    counter!("identity_activations_total", "outcome" => outcome).increment(1);
}

/// 记录认证过滤器的决策
pub fn record_filter_decision(decision: &'static str) {
    counter!("identity_filter_decisions_total", "decision" => decision).increment(1);
}
