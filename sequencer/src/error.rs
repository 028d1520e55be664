use thiserror::Error;

#[derive(Debug, Error)]
pub enum TcrError {
    #[error("ledger error: {0}")]
    Ledger(#[from] tcr_ledger::LedgerError),

    #[error("registry error: {0}")]
    Registry(#[from] tcr_registry::RegistryError),

    #[error("parameterizer error: {0}")]
    Parameterizer(#[from] tcr_parameterizer::ParameterizerError),

    #[error("voting error: {0}")]
    Voting(#[from] tcr_voting::VotingError),

    #[error("challenge error: {0}")]
    Challenge(#[from] tcr_challenge::ChallengeError),

    #[error("resolver error: {0}")]
    Resolver(#[from] tcr_challenge::ResolverError),

    #[error("invalid parameter: {0}")]
    Types(#[from] tcr_types::TypesError),

    #[error("config error: {0}")]
    Config(String),
}
