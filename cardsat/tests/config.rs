//! Loading solver configurations from TOML.
use cardsat::config::ConfigError;
use cardsat::handler::NoHandler;
use cardsat::{ClauseMinimization, Outcome, Solver, SolverConfig, SolverError};

#[test]
fn partial_toml_keeps_defaults() {
    let config: SolverConfig = toml::from_str(
        r#"
        var_decay = 0.85
        clause_minimization = "basic"
        first_reduce_db = 100
        "#,
    )
    .unwrap();

    let defaults = SolverConfig::default();
    assert_eq!(config.var_decay, 0.85);
    assert_eq!(config.clause_minimization, ClauseMinimization::Basic);
    assert_eq!(config.first_reduce_db, 100);
    assert_eq!(config.max_var_decay, defaults.max_var_decay);
    assert_eq!(config.size_trail_queue, defaults.size_trail_queue);

    let mut solver = Solver::with_config(config).unwrap();
    let a = solver.new_var(true, true);
    solver.add_clause(&[a.negative()], None).unwrap();
    assert_eq!(solver.solve(&mut NoHandler), Ok(Outcome::Done(true)));
}

#[test]
fn invalid_toml_config_is_rejected() {
    let config: SolverConfig = toml::from_str("var_decay = 0.99\nmax_var_decay = 0.9\n").unwrap();
    assert_eq!(
        Solver::with_config(config).err(),
        Some(SolverError::InvalidConfig(ConfigError::DecayAboveMaximum {
            initial: 0.99,
            max: 0.9,
        }))
    );
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = SolverConfig::default();
    config.reduce_on_size = true;
    config.factor_k = 0.7;
    let text = toml::to_string(&config).unwrap();
    let parsed: SolverConfig = toml::from_str(&text).unwrap();
    assert!(parsed.reduce_on_size);
    assert_eq!(parsed.factor_k, 0.7);
}
