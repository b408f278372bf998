//! Configuration validation utilities.
//!
//! Detects broken references and name collisions:
//! - Roles, file rules, views and viewing rules naming missing color spaces
//! - Views naming missing view transforms or looks
//! - Names shared between color spaces, named transforms and roles
//! - Inactive entries that name nothing
//!
//! # Example
//!
//! ```
//! use vfx_ocio::{builtin, validate};
//!
//! let issues = validate::check(&builtin::reference());
//! assert!(!validate::has_errors(&issues));
//!
//! for issue in &issues {
//!     println!("{}: {}", issue.severity, issue.message);
//! }
//! ```

use std::collections::HashMap;

use crate::config::Config;
use crate::display::{Display, USE_DISPLAY_NAME, View};
use crate::file_rules::FileRuleKind;
use crate::look::parse_looks;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning - config works but may have issues.
    Warning,
    /// Error - config has problems that may cause failures.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A validation issue found in the config.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Severity level.
    pub severity: Severity,
    /// Issue category.
    pub category: IssueCategory,
    /// Human-readable message.
    pub message: String,
    /// Related element (color space name, role, etc.).
    pub context: Option<String>,
}

/// Categories of validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    /// Missing color space reference.
    MissingColorSpace,
    /// Missing view transform reference.
    MissingViewTransform,
    /// Missing look reference.
    MissingLook,
    /// Missing display/view.
    MissingDisplay,
    /// Invalid transform configuration.
    InvalidTransform,
    /// Name used twice across namespaces.
    Duplicate,
}

struct Report(Vec<Issue>);

impl Report {
    fn push(&mut self, severity: Severity, category: IssueCategory, context: impl Into<String>, message: String) {
        self.0.push(Issue {
            severity,
            category,
            message,
            context: Some(context.into()),
        });
    }

    fn error(&mut self, category: IssueCategory, context: impl Into<String>, message: String) {
        self.push(Severity::Error, category, context, message);
    }
}

/// Validates a config and returns all issues found.
pub fn check(config: &Config) -> Vec<Issue> {
    let mut report = Report(Vec::new());

    check_names(config, &mut report);
    check_roles(config, &mut report);
    check_colorspaces(config, &mut report);
    check_file_rules(config, &mut report);
    check_displays(config, &mut report);
    check_looks(config, &mut report);
    check_inactive(config, &mut report);

    report.0
}

/// Checks that every name and alias is used once across color spaces,
/// named transforms and roles.
fn check_names(config: &Config, report: &mut Report) {
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut claim = |report: &mut Report, name: &str, owner: String| {
        if let Some(prev) = owners.insert(name.to_ascii_lowercase(), owner.clone()) {
            report.error(
                IssueCategory::Duplicate,
                name,
                format!("name '{name}' of {owner} is already used by {prev}"),
            );
        }
    };

    for cs in config.colorspaces() {
        claim(report, cs.name(), format!("color space '{}'", cs.name()));
        for alias in cs.aliases() {
            claim(report, alias, format!("color space '{}'", cs.name()));
        }
    }
    for nt in config.named_transforms() {
        claim(report, nt.name(), format!("named transform '{}'", nt.name()));
        for alias in nt.aliases() {
            claim(report, alias, format!("named transform '{}'", nt.name()));
        }
    }
    for (role, _) in config.roles().iter() {
        claim(report, role, format!("role '{role}'"));
    }
}

/// Checks that role targets exist.
fn check_roles(config: &Config, report: &mut Report) {
    for (role, cs_name) in config.roles().iter() {
        if config.colorspace_index(cs_name).is_none() {
            report.error(
                IssueCategory::MissingColorSpace,
                role,
                format!("role '{role}' references non-existent color space '{cs_name}'"),
            );
        }
    }
}

fn check_colorspaces(config: &Config, report: &mut Report) {
    for cs in config.colorspaces() {
        if cs.is_data() && !cs.has_no_transforms() {
            report.push(
                Severity::Warning,
                IssueCategory::InvalidTransform,
                cs.name(),
                format!("data color space '{}' has transforms defined (will be ignored)", cs.name()),
            );
        }
    }
    for nt in config.named_transforms() {
        if nt.forward().is_none() && nt.inverse().is_none() {
            report.error(
                IssueCategory::InvalidTransform,
                nt.name(),
                format!("named transform '{}' defines no transform", nt.name()),
            );
        }
    }
}

fn check_file_rules(config: &Config, report: &mut Report) {
    for rule in config.file_rules().rules() {
        if rule.kind() == &FileRuleKind::PathSearch {
            continue;
        }
        if config.colorspace(rule.colorspace()).is_none() {
            report.error(
                IssueCategory::MissingColorSpace,
                rule.name(),
                format!(
                    "file rule '{}' references non-existent color space '{}'",
                    rule.name(),
                    rule.colorspace()
                ),
            );
        }
    }
    for rule in config.viewing_rules().rules() {
        for cs in rule.colorspaces() {
            if config.colorspace(cs).is_none() {
                report.error(
                    IssueCategory::MissingColorSpace,
                    rule.name(),
                    format!("viewing rule '{}' references non-existent color space '{cs}'", rule.name()),
                );
            }
        }
    }
}

fn check_view(config: &Config, display: &str, view: &View, report: &mut Report) {
    let context = format!("{display}:{}", view.name());
    let cs = if view.colorspace() == USE_DISPLAY_NAME { display } else { view.colorspace() };
    // A shared view only resolves USE_DISPLAY_NAME once placed in a display.
    if !(display.is_empty() && view.colorspace() == USE_DISPLAY_NAME) && config.colorspace(cs).is_none() {
        report.error(
            IssueCategory::MissingColorSpace,
            context.clone(),
            format!("view '{}' references non-existent color space '{cs}'", view.name()),
        );
    }
    if let Some(vt) = view.view_transform() {
        if config.view_transform(vt).is_none() {
            report.error(
                IssueCategory::MissingViewTransform,
                context.clone(),
                format!("view '{}' references non-existent view transform '{vt}'", view.name()),
            );
        }
    }
    if let Some(looks) = view.looks() {
        for (look, _) in parse_looks(looks) {
            if config.look(look).is_none() {
                report.error(
                    IssueCategory::MissingLook,
                    context.clone(),
                    format!("view '{}' references non-existent look '{look}'", view.name()),
                );
            }
        }
    }
}

fn check_display(config: &Config, display: &Display, report: &mut Report) {
    for view in display.views() {
        check_view(config, display.name(), view, report);
    }
    for shared in display.shared_views() {
        match config.shared_view(shared) {
            Some(view) => check_view(config, display.name(), view, report),
            None => report.error(
                IssueCategory::MissingDisplay,
                format!("{}:{shared}", display.name()),
                format!("display '{}' references non-existent shared view '{shared}'", display.name()),
            ),
        }
    }
}

/// Checks display/view definitions.
fn check_displays(config: &Config, report: &mut Report) {
    if config.displays().is_empty() {
        report.push(
            Severity::Warning,
            IssueCategory::MissingDisplay,
            "displays",
            "no displays defined".to_string(),
        );
    }

    for view in config.shared_views() {
        check_view(config, "", view, report);
    }
    for display in config.displays() {
        if display.is_empty() {
            report.push(
                Severity::Warning,
                IssueCategory::MissingDisplay,
                display.name(),
                format!("display '{}' has no views", display.name()),
            );
        }
        check_display(config, display, report);
    }
    for shared in config.virtual_display().shared_views() {
        if config.shared_view(shared).is_none() {
            report.error(
                IssueCategory::MissingDisplay,
                shared.clone(),
                format!("virtual display references non-existent shared view '{shared}'"),
            );
        }
    }

    let dvt = config.default_view_transform();
    if !dvt.is_empty() && config.view_transform(dvt).is_none() {
        report.error(
            IssueCategory::MissingViewTransform,
            dvt,
            format!("default view transform '{dvt}' does not exist"),
        );
    }

    for name in config.active_displays() {
        if config.display(name).is_none() {
            report.push(
                Severity::Warning,
                IssueCategory::MissingDisplay,
                name.clone(),
                format!("active display '{name}' does not exist"),
            );
        }
    }
}

fn check_looks(config: &Config, report: &mut Report) {
    for look in config.looks() {
        let ps = look.get_process_space();
        if !ps.is_empty() && config.colorspace(ps).is_none() {
            report.error(
                IssueCategory::MissingColorSpace,
                look.name(),
                format!("look '{}' references non-existent process space '{ps}'", look.name()),
            );
        }
    }
}

fn check_inactive(config: &Config, report: &mut Report) {
    for name in config.inactive_colorspaces() {
        if config.colorspace_index(name).is_none() && config.named_transform(name).is_none() {
            report.error(
                IssueCategory::MissingColorSpace,
                name.clone(),
                format!("inactive entry '{name}' names no color space or named transform"),
            );
        }
    }
}

/// Returns true if there are any errors.
pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

/// Returns true if there are any warnings or errors.
pub fn has_warnings(issues: &[Issue]) -> bool {
    issues
        .iter()
        .any(|i| i.severity == Severity::Warning || i.severity == Severity::Error)
}
