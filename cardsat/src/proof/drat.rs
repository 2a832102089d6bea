//! DRAT output of recorded proofs.
use std::io::{self, Write};

use cardsat_formula::Lit;

use super::ProofStep;

/// Prepares a proof step for DRAT writing
fn drat_step(
    step: &ProofStep,
    mut emit_drat_step: impl FnMut(bool, &[Lit]) -> io::Result<()>,
) -> io::Result<()> {
    match step {
        ProofStep::AddClause { clause } => emit_drat_step(true, clause),
        ProofStep::DeleteClause { clause } => emit_drat_step(false, clause),
        ProofStep::Contradiction => emit_drat_step(true, &[]),
    }
}

/// Writes a proof step in DRAT format
pub fn write_step(target: &mut impl Write, step: &ProofStep) -> io::Result<()> {
    drat_step(step, |add, clause| {
        if !add {
            target.write_all(b"d ")?;
        }
        write_literals(target, clause)
    })
}

/// Writes a proof step in binary DRAT format
pub fn write_binary_step(target: &mut impl Write, step: &ProofStep) -> io::Result<()> {
    drat_step(step, |add, clause| {
        if add {
            target.write_all(b"a")?;
        } else {
            target.write_all(b"d")?;
        }
        write_binary_literals(target, clause)
    })
}

/// Writes all steps of a proof.
pub fn write_proof(target: &mut impl Write, steps: &[ProofStep], binary: bool) -> io::Result<()> {
    for step in steps {
        if binary {
            write_binary_step(target, step)?;
        } else {
            write_step(target, step)?;
        }
    }
    target.flush()
}

/// Writes the literals of a clause for a step in a DRAT proof.
fn write_literals(target: &mut impl Write, literals: &[Lit]) -> io::Result<()> {
    for &lit in literals {
        itoa::write(&mut *target, lit.to_dimacs())?;
        target.write_all(b" ")?;
    }
    target.write_all(b"0\n")?;
    Ok(())
}

/// Writes the literals of a clause for a step in a binary DRAT proof.
fn write_binary_literals(target: &mut impl Write, literals: &[Lit]) -> io::Result<()> {
    for &lit in literals {
        let drat_code = lit.code() as u64 + 2;
        leb128::write::unsigned(target, drat_code)?;
    }
    target.write_all(&[0])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use cardsat_formula::lits;

    fn steps() -> Vec<ProofStep> {
        vec![
            ProofStep::AddClause {
                clause: lits![1, -2].to_vec(),
            },
            ProofStep::DeleteClause {
                clause: lits![-1, 3, 2].to_vec(),
            },
            ProofStep::Contradiction,
        ]
    }

    #[test]
    fn text_drat() {
        let mut out = vec![];
        write_proof(&mut out, &steps(), false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 -2 0\nd -1 3 2 0\n0\n");
    }

    #[test]
    fn binary_drat() {
        let mut out = vec![];
        write_proof(&mut out, &steps(), true).unwrap();
        assert_eq!(
            out,
            vec![b'a', 2, 5, 0, b'd', 3, 6, 4, 0, b'a', 0],
        );
    }
}
