use crate::{db::OrmConn, mailer::Mailer, token::TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub tokens: TokenIssuer,
    pub mailer: Mailer,
}
