//! Forward labels and short/long branch selection.
//!
//! The expression is emitted twice. The measuring pass records every label
//! and branch at its offset with all branches short. `compute` then widens,
//! until nothing changes, each branch whose displacement no longer fits an
//! `i8` once the branches before it have grown. The writing pass replays the
//! same sequence of labels and branches and checks every offset against the
//! prediction.

use rill_bytecode::{BranchForm, BranchKind, Instruction};

use super::EmitError;

/// Size a branch grows by when it goes long.
const WIDENING: u32 = BranchForm::Long.size() - BranchForm::Short.size();

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u32);

impl Label {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    Measure,
    Write,
}

/// A branch recorded by the measuring pass.
#[derive(Clone, Debug)]
struct BranchSite {
    at: u32,
    label: Label,
    long: bool,
}

#[derive(Debug)]
pub struct BranchManager {
    pass: Pass,
    labels: Vec<Option<u32>>,
    sites: Vec<BranchSite>,
    next_label: usize,
    next_site: usize,
}

impl Default for BranchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchManager {
    pub fn new() -> Self {
        Self {
            pass: Pass::Measure,
            labels: Vec::new(),
            sites: Vec::new(),
            next_label: 0,
            next_site: 0,
        }
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn branch_count(&self) -> usize {
        self.sites.len()
    }

    pub fn long_count(&self) -> usize {
        self.sites.iter().filter(|s| s.long).count()
    }

    pub fn define_label(&mut self) -> Result<Label, EmitError> {
        match self.pass {
            Pass::Measure => {
                self.labels.push(None);
                Ok(Label(self.labels.len() as u32 - 1))
            }
            Pass::Write => {
                if self.next_label >= self.labels.len() {
                    return Err(EmitError::Internal(
                        "writing pass defined more labels than measured".to_string(),
                    ));
                }
                self.next_label += 1;
                Ok(Label(self.next_label as u32 - 1))
            }
        }
    }

    pub fn mark_label(&mut self, label: Label, offset: u32) -> Result<(), EmitError> {
        match self.pass {
            Pass::Measure => {
                let slot = self
                    .labels
                    .get_mut(label.index())
                    .ok_or(EmitError::UnmarkedLabel(label.0))?;
                *slot = Some(offset);
                Ok(())
            }
            Pass::Write => {
                let expected = self.label_offset(label)?;
                if expected != offset {
                    return Err(EmitError::LabelMismatch {
                        label: label.0,
                        expected,
                        actual: offset,
                    });
                }
                Ok(())
            }
        }
    }

    /// Branch instruction to `label` starting at `offset`.
    pub fn branch(
        &mut self,
        kind: BranchKind,
        label: Label,
        offset: u32,
    ) -> Result<Instruction, EmitError> {
        match self.pass {
            Pass::Measure => {
                self.sites.push(BranchSite {
                    at: offset,
                    label,
                    long: false,
                });
                Ok(Instruction::branch(kind, BranchForm::Short, 0))
            }
            Pass::Write => {
                let index = self.next_site;
                let site = self.sites.get(index).cloned().ok_or_else(|| {
                    EmitError::Internal("writing pass emitted more branches than measured".into())
                })?;
                self.next_site += 1;
                if site.label != label {
                    return Err(EmitError::Internal(format!(
                        "branch {index} targets label {} instead of {}",
                        label.0, site.label.0
                    )));
                }
                let expected = self.predict(site.at);
                if expected != offset {
                    return Err(EmitError::BranchMismatch {
                        index,
                        expected,
                        actual: offset,
                    });
                }
                let form = if site.long {
                    BranchForm::Long
                } else {
                    BranchForm::Short
                };
                let target = self.label_offset(label)? as i64;
                let end = (offset + form.size()) as i64;
                Ok(Instruction::branch(kind, form, (target - end) as i32))
            }
        }
    }

    /// Offset a measured offset moves to once long branches before it grow.
    pub fn predict(&self, measured: u32) -> u32 {
        let grown = self
            .sites
            .iter()
            .filter(|s| s.long && s.at < measured)
            .count() as u32;
        measured + WIDENING * grown
    }

    fn label_offset(&self, label: Label) -> Result<u32, EmitError> {
        let measured = self
            .labels
            .get(label.index())
            .copied()
            .flatten()
            .ok_or(EmitError::UnmarkedLabel(label.0))?;
        Ok(self.predict(measured))
    }

    /// Decide which branches go long. Runs to a fixpoint; a branch never
    /// goes back to short, so this terminates.
    pub fn compute(&mut self) -> Result<(), EmitError> {
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut widened = Vec::new();
            for (i, site) in self.sites.iter().enumerate() {
                if site.long {
                    continue;
                }
                let target = self.label_offset(site.label)? as i64;
                let end = (self.predict(site.at) + BranchForm::Short.size()) as i64;
                let displacement = target - end;
                if i8::try_from(displacement).is_err() {
                    tracing::trace!(branch = i, displacement, "branch goes long");
                    widened.push(i);
                }
            }
            if widened.is_empty() {
                break;
            }
            for i in widened {
                self.sites[i].long = true;
            }
        }
        tracing::trace!(
            rounds,
            branches = self.sites.len(),
            long = self.long_count(),
            "branch layout settled"
        );
        Ok(())
    }

    /// Switch to the writing pass.
    pub fn begin_write(&mut self) {
        self.pass = Pass::Write;
        self.next_label = 0;
        self.next_site = 0;
    }

    /// Check the writing pass replayed every label and branch.
    pub fn finish(&self) -> Result<(), EmitError> {
        if self.next_label != self.labels.len() || self.next_site != self.sites.len() {
            return Err(EmitError::Internal(format!(
                "writing pass replayed {}/{} labels and {}/{} branches",
                self.next_label,
                self.labels.len(),
                self.next_site,
                self.sites.len()
            )));
        }
        Ok(())
    }
}
