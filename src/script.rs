// 📜 Ledger Script - Replay a CSV of ledger operations
//
// Columns: op,ref,name,bank,user,to_user,to_bank,amount,allow_negative,policy
//
//   bank     ref, allow_negative?, policy?
//   user     ref, name
//   account  ref, user, bank, amount? (initial balance, default 0)
//   deposit  ref (account), amount
//   withdraw ref (account), amount
//   send     bank, user, to_user, amount, to_bank?
//
// `ref` is a label local to the script; the runner maps it to the
// generated id. Ledger rejections (insufficient funds, …) are recorded and
// the run continues; malformed rows abort the run.

use crate::entities::FundingPolicy;
use crate::error::LedgerError;
use crate::registry::Registry;
use crate::transfer::TransferReceipt;
use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptOp {
    Bank,
    User,
    Account,
    Deposit,
    Withdraw,
    Send,
}

/// One CSV row
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScriptStep {
    pub op: Option<ScriptOp>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub name: Option<String>,
    pub bank: Option<String>,
    pub user: Option<String>,
    pub to_user: Option<String>,
    pub to_bank: Option<String>,
    pub amount: Option<Decimal>,
    pub allow_negative: Option<bool>,
    pub policy: Option<String>,
}

/// A ledger operation the script asked for but the ledger refused
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub op: ScriptOp,
    pub kind: &'static str,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub executed: usize,
    pub rejected: Vec<Rejection>,
    pub transfers: Vec<TransferReceipt>,
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open script {}", path.display()))?;
    collect_steps(rdr)
}

pub fn parse_script<R: Read>(reader: R) -> Result<Vec<ScriptStep>> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    collect_steps(rdr)
}

fn collect_steps<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let step: ScriptStep =
            result.with_context(|| format!("Failed to parse script row {}", index + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

// ============================================================================
// RUNNER
// ============================================================================

pub struct ScriptRunner {
    registry: Registry,

    /// Script label → generated id (one namespace for all entity kinds)
    refs: HashMap<String, String>,
}

impl ScriptRunner {
    pub fn new(registry: Registry) -> Self {
        ScriptRunner {
            registry,
            refs: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Generated id behind a script label
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.refs.get(label).map(String::as_str)
    }

    pub fn run(&mut self, steps: &[ScriptStep]) -> Result<RunReport> {
        let mut report = RunReport::default();

        for (index, step) in steps.iter().enumerate() {
            let row = index + 1;
            let op = step
                .op
                .ok_or_else(|| anyhow!("Row {}: missing op", row))?;

            match self.apply(op, step).with_context(|| format!("Row {} ({:?})", row, op))? {
                Ok(receipt) => {
                    report.executed += 1;
                    if let Some(receipt) = receipt {
                        report.transfers.push(receipt);
                    }
                }
                Err(e) => {
                    debug!(row, ?op, error = %e, "operation rejected");
                    report.rejected.push(Rejection {
                        row,
                        op,
                        kind: e.kind(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            executed = report.executed,
            rejected = report.rejected.len(),
            "script finished"
        );
        Ok(report)
    }

    /// Outer error: malformed row. Inner error: ledger rejection.
    fn apply(
        &mut self,
        op: ScriptOp,
        step: &ScriptStep,
    ) -> Result<std::result::Result<Option<TransferReceipt>, LedgerError>> {
        match op {
            ScriptOp::Bank => {
                let label = required(&step.reference, "ref")?;
                let allow_negative = step
                    .allow_negative
                    .unwrap_or(self.registry.config().default_allow_negative);
                let bank_id = self.registry.create_bank(allow_negative);

                if let Some(policy) = &step.policy {
                    let policy: FundingPolicy = policy.parse().map_err(|e: String| anyhow!(e))?;
                    if let Some(bank) = self.registry.bank_mut(&bank_id) {
                        bank.set_funding_policy(policy);
                    }
                }

                self.bind(label, bank_id)?;
                Ok(Ok(None))
            }
            ScriptOp::User => {
                let label = required(&step.reference, "ref")?;
                let name = required(&step.name, "name")?;
                let user_id = self.registry.create_user(name);
                self.bind(label, user_id)?;
                Ok(Ok(None))
            }
            ScriptOp::Account => {
                let label = required(&step.reference, "ref")?;
                let user_id = self.lookup(required(&step.user, "user")?)?;
                let bank_id = self.lookup(required(&step.bank, "bank")?)?;
                let initial = step.amount.unwrap_or(Decimal::ZERO);

                match self.registry.open_account(&user_id, &bank_id, initial) {
                    Ok(account_id) => {
                        self.bind(label, account_id)?;
                        Ok(Ok(None))
                    }
                    Err(e) => Ok(Err(e)),
                }
            }
            ScriptOp::Deposit | ScriptOp::Withdraw => {
                let account_id = self.lookup(required(&step.reference, "ref")?)?;
                let amount = step.amount.ok_or_else(|| anyhow!("missing amount"))?;
                let account = self
                    .registry
                    .account_mut(&account_id)
                    .ok_or_else(|| anyhow!("unknown account {}", account_id))?;

                let outcome = if op == ScriptOp::Deposit {
                    account.deposit(amount)
                } else {
                    account.withdraw(amount)
                };
                Ok(outcome.map(|_| None))
            }
            ScriptOp::Send => {
                let bank_id = self.lookup(required(&step.bank, "bank")?)?;
                let from = self.lookup(required(&step.user, "user")?)?;
                let to = self.lookup(required(&step.to_user, "to_user")?)?;
                let amount = step.amount.ok_or_else(|| anyhow!("missing amount"))?;
                let to_bank = match &step.to_bank {
                    Some(label) => Some(self.lookup(label)?),
                    None => None,
                };

                Ok(self
                    .registry
                    .send(&bank_id, &from, &to, amount, to_bank.as_deref())
                    .map(Some))
            }
        }
    }

    fn bind(&mut self, label: &str, id: String) -> Result<()> {
        if self.refs.contains_key(label) {
            bail!("duplicate ref {}", label);
        }
        self.refs.insert(label.to_string(), id);
        Ok(())
    }

    fn lookup(&self, label: &str) -> Result<String> {
        self.refs
            .get(label)
            .cloned()
            .ok_or_else(|| anyhow!("unknown ref {}", label))
    }
}

fn required<'a>(field: &'a Option<String>, column: &str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| anyhow!("missing {}", column))
}
