//! Compute glue levels of clauses.
//!
//! The glue level of a propagating clause is the number of distinct decision levels of the clause's
//! variables. This is also called the literal block distance (LBD). Learned clauses with a small
//! glue level are kept longer when the clause database is reduced.
//!
//! With `reduce_on_size` enabled, short clauses are rated by their length instead and longer clauses
//! are penalized by their length.

use partial_ref::{partial, PartialRef};

use cardsat_formula::Lit;

use crate::context::{parts::*, Context};

/// Compute the glue level of a clause.
///
/// All literals of the clause must be assigned.
pub fn compute_glue(
    mut ctx: partial!(Context, mut TmpDataP, ImplGraphP, SolverConfigP),
    lits: &[Lit],
) -> usize {
    let (tmp_data, ctx) = ctx.split_part_mut(TmpDataP);
    let impl_graph = ctx.part(ImplGraphP);
    let flags = &mut tmp_data.flags;

    let mut glue = 0;

    for &lit in lits {
        let level = impl_graph.level(lit.var());
        let flag = &mut flags[level];
        if !*flag {
            *flag = true;
            glue += 1
        }
    }

    for &lit in lits {
        let level = impl_graph.level(lit.var());
        flags[level] = false;
    }

    let config = ctx.part(SolverConfigP);
    if !config.reduce_on_size {
        glue
    } else if lits.len() < config.reduce_on_size_size {
        lits.len()
    } else {
        lits.len() + glue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{lit, lits};

    use crate::context::set_var_count;
    use crate::prop::{enqueue_assignment, Reason};

    #[test]
    fn counts_distinct_levels() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 6);

        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Unit);
        for &lit in lits![2, 3, 4].iter() {
            ctx.part_mut(TrailP).new_decision_level();
            enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
        }
        enqueue_assignment(ctx.borrow(), lit!(5), Reason::Binary([lit!(-4)]));

        assert_eq!(compute_glue(ctx.borrow(), &lits![-1, -2, -4, -5]), 3);
        assert_eq!(compute_glue(ctx.borrow(), &lits![-5, -4]), 1);

        ctx.part_mut(SolverConfigP).reduce_on_size = true;
        ctx.part_mut(SolverConfigP).reduce_on_size_size = 3;

        assert_eq!(compute_glue(ctx.borrow(), &lits![-5, -4]), 2);
        assert_eq!(compute_glue(ctx.borrow(), &lits![-1, -2, -4, -5]), 7);
    }
}
