use std::env;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

/// `GET /get_messages/{id}` body for an open ticket with a text exchange
/// followed by a voice note.
pub fn transcript_fixture() -> &'static str {
    return r#"
{
  "messages": [
    {
      "remetente": "user",
      "tipo": "texto",
      "conteudo": "Olá, preciso de ajuda com meu pedido"
    },
    {
      "remetente": "admin",
      "tipo": "texto",
      "conteudo": "Claro! Qual o número do pedido?"
    },
    {
      "remetente": "user",
      "tipo": "audio",
      "conteudo": "audio_1700000000.webm"
    }
  ],
  "status": "Aberto"
}
"#
    .trim();
}

/// `POST /my_tickets` body with one open and one closed ticket.
pub fn my_tickets_fixture() -> &'static str {
    return r##"
[
  {
    "uuid": "abc",
    "ticket": "#0001",
    "category": "Suporte",
    "status": "Aberto"
  },
  {
    "uuid": "def",
    "ticket": "#0002",
    "category": "Financeiro",
    "status": "Fechado"
  }
]
"##
    .trim();
}
