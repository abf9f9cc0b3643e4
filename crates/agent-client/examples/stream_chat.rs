use agent_client::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    agent_client::init_observability();

    let client = AgentClient::builder()
        .config(ClientConfig::from_env())
        .build()?;
    let mut session = ChatSession::new();

    let mut turn = client.start_turn(&mut session, "What's the weather in Paris right now?")?;
    while let Some(event) = turn.next_event().await {
        match event {
            TurnEvent::Agent(AgentEvent::Thinking { token }) => eprint!("{token}"),
            TurnEvent::Agent(AgentEvent::ThinkingEnd) => eprintln!(),
            TurnEvent::Agent(AgentEvent::Response { token }) => print!("{token}"),
            TurnEvent::Agent(_) => {}
            TurnEvent::Completed => {
                println!();
                break;
            }
            TurnEvent::Failed(failure) => {
                eprintln!("turn failed: {failure}");
                break;
            }
        }
    }
    Ok(())
}
