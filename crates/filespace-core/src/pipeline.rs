//! Ordered submission of dependent actions.

use filespace_types::action::Action;
use tracing::{debug, warn};

use crate::ledger::Ledger;
use crate::{FilespaceError, Result};

/// Submit `steps` in order, stopping at the first failure.
///
/// The error names the failed step. Steps already accepted by the ledger stay
/// applied; nothing is rolled back.
pub async fn submit_pipeline<L: Ledger>(ledger: &L, steps: &[Action], authorizer: &str) -> Result<()> {
    for (position, action) in steps.iter().enumerate() {
        let step = action.kind();
        debug!(%step, position, total = steps.len(), "Submitting action");
        if let Err(source) = ledger.submit(action, authorizer).await {
            warn!(
                %step,
                error = %source,
                skipped = steps.len() - position - 1,
                "Submission failed, remaining steps skipped"
            );
            return Err(FilespaceError::Step { step, source });
        }
    }
    Ok(())
}

/// Submit a single action.
pub async fn submit_one<L: Ledger>(ledger: &L, action: Action, authorizer: &str) -> Result<()> {
    submit_pipeline(ledger, std::slice::from_ref(&action), authorizer).await
}
