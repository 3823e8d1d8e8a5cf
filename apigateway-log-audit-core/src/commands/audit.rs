//! Audit run for the service layer.
//!
//! Scopes, API families, APIs and stages are processed strictly one after
//! another. Every failure and finding is captured as a diagnostic; the run
//! always completes with whatever log groups could be accepted.

use log::{debug, info, warn};

use crate::aws::StageLister;
use crate::checks::StageChecker;
use crate::config::{AccountScope, AuditConfig};
use crate::diagnostics::DiagnosticsCollector;
use crate::results::assemble_log_group_names;
use crate::selection::{check_selector_list, scope_apis, Selection};
use crate::types::{ActionMode, ApiFamily, AuditReport, Diagnostic};

impl super::service::AuditService {
    /// Audit every configured scope and return the accepted log group names
    /// together with the consolidated diagnostics.
    pub async fn run(&self, config: &AuditConfig) -> AuditReport {
        let mut diagnostics = DiagnosticsCollector::default();

        // An include scope without selectors aborts the whole run.
        if let Some(diagnostic) = config
            .accounts
            .iter()
            .find_map(|scope| check_selector_list(&scope.api_list, scope.mode()).err())
        {
            warn!("{}", diagnostic.message);
            diagnostics.add(diagnostic);
            return AuditReport {
                log_group_names: Vec::new(),
                diagnostics: diagnostics.finish(),
            };
        }

        let mut checker =
            StageChecker::new(config.format_verifier(), config.ignore_access_log_settings);
        let mut rest_names = Vec::new();
        let mut http_names = Vec::new();

        for scope in &config.accounts {
            info!(
                "Auditing {} ({:?}, {} selectors)",
                scope.region,
                scope.mode(),
                scope.api_list.len()
            );
            let lister = match self.factory.lister_for(scope).await {
                Ok(lister) => lister,
                Err(err) => {
                    warn!("Skipping scope {}: {}", describe(scope), err);
                    diagnostics.add(Diagnostic::error(err.to_string()));
                    continue;
                }
            };
            let selection = Selection::parse(&scope.api_list, &mut diagnostics);

            for family in ApiFamily::ALL {
                if !family.supports_execution_logs() && checker.ignores_access_logs() {
                    debug!("Access log settings ignored, skipping {} APIs", family);
                    continue;
                }
                let accepted = audit_family(
                    lister.as_ref(),
                    family,
                    &selection,
                    scope.mode(),
                    &mut checker,
                    &mut diagnostics,
                )
                .await;
                match family {
                    ApiFamily::Rest => rest_names.extend(accepted),
                    ApiFamily::Http => http_names.extend(accepted),
                }
            }
        }

        let log_group_names = assemble_log_group_names(rest_names, http_names);
        info!(
            "Audit finished: {} log groups accepted",
            log_group_names.len()
        );
        AuditReport {
            log_group_names,
            diagnostics: diagnostics.finish(),
        }
    }
}

/// List, scope and check the APIs of one family within one scope.
async fn audit_family(
    lister: &dyn StageLister,
    family: ApiFamily,
    selection: &Selection,
    mode: ActionMode,
    checker: &mut StageChecker,
    diagnostics: &mut DiagnosticsCollector,
) -> Vec<String> {
    let mut api_ids = Vec::new();
    for page in lister.list_apis(family).await {
        match page {
            Ok(ids) => api_ids.extend(ids),
            Err(err) => {
                warn!("{} API page skipped: {}", family, err);
                diagnostics.add(Diagnostic::error(err.to_string()));
            }
        }
    }

    let scoped = scope_apis(&api_ids, selection, mode);
    info!(
        "{} APIs: {} listed, {} in scope",
        family,
        api_ids.len(),
        scoped.len()
    );

    let mut accepted = Vec::new();
    for (api_id, decision) in &scoped {
        let stages = match lister.list_stages(family, api_id).await {
            Ok(stages) => stages,
            Err(err) => {
                warn!("{} API {} skipped: {}", family, api_id, err);
                diagnostics.add(Diagnostic::error(err.to_string()));
                continue;
            }
        };
        for stage in stages
            .iter()
            .filter(|stage| decision.keeps_stage(&stage.stage_name, mode))
        {
            accepted.extend(checker.check_stage(family, api_id, stage, diagnostics));
        }
    }
    accepted
}

fn describe(scope: &AccountScope) -> String {
    match scope.role_arn() {
        Some(role_arn) => format!("{} via {}", scope.region, role_arn),
        None => scope.region.clone(),
    }
}
