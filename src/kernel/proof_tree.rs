use crate::kernel::atom::{AssertionId, Atom, SyntaxId, VarId, WorkVarId};
use crate::kernel::term::Term;

/// A node in the proof of a single step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofNode {
    /// A hypothesis of the theorem being proved.
    Hyp { label: String, formula: Term },

    /// The term substituted for one of an assertion's variables.
    Syntax(Term),

    /// An assertion applied to its hypotheses.
    /// Children parallel the assertion's hypothesis array: variable slots first, then
    /// the proofs of the logical hypotheses.
    Apply {
        assertion: AssertionId,
        children: Vec<ProofNode>,
    },
}

/// One entry of a proof in reverse Polish notation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpnLabel {
    Syntax(SyntaxId),
    Var(VarId),
    WorkVar(WorkVarId),
    Assertion(AssertionId),
    Hyp(String),
}

impl From<Atom> for RpnLabel {
    fn from(atom: Atom) -> RpnLabel {
        match atom {
            Atom::Syntax(s) => RpnLabel::Syntax(s),
            Atom::Var(v) => RpnLabel::Var(v),
            Atom::WorkVar(w) => RpnLabel::WorkVar(w),
        }
    }
}

impl ProofNode {
    pub fn to_rpn(&self) -> Vec<RpnLabel> {
        let mut answer = vec![];
        self.push_rpn(&mut answer);
        answer
    }

    fn push_rpn(&self, output: &mut Vec<RpnLabel>) {
        match self {
            ProofNode::Hyp { label, .. } => output.push(RpnLabel::Hyp(label.clone())),
            ProofNode::Syntax(term) => {
                output.extend(term.to_rpn().into_iter().map(RpnLabel::from));
            }
            ProofNode::Apply {
                assertion,
                children,
            } => {
                for child in children {
                    child.push_rpn(output);
                }
                output.push(RpnLabel::Assertion(*assertion));
            }
        }
    }

    /// Number of assertion applications in the tree.
    pub fn num_steps(&self) -> usize {
        match self {
            ProofNode::Apply { children, .. } => {
                1 + children.iter().map(|c| c.num_steps()).sum::<usize>()
            }
            _ => 0,
        }
    }
}
