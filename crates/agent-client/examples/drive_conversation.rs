use agent_client::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    agent_client::init_observability();

    let client = AgentClient::builder()
        .config(ClientConfig::from_env())
        .build()?;
    let mut session = ChatSession::new();

    for prompt in ["Tell me about Lisbon.", "And what time is it there?"] {
        let mut turn = client.start_turn(&mut session, prompt)?;
        let outcome = turn.drive(session.conversation_mut()).await;
        println!("-- turn ended: {outcome:?}");
    }

    for message in session.conversation().messages() {
        println!("[{:?}] {}", message.kind, message.content);
    }

    if let Ok(status) = client.memory_status(session.id()).await {
        println!("backend remembers {} messages", status.message_count);
    }
    Ok(())
}
