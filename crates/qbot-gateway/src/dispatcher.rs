use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use qbot_types::{Answer, Message, Profile, Question, User};

use crate::commands::Command;
use crate::context::AppState;
use crate::error::DispatchError;
use crate::replies;

/// Drain the queue one message at a time, in arrival order.
///
/// This is the only task that writes to the store, which is what makes the
/// check-then-insert on users safe without locking.
pub async fn run_dispatcher(ctx: AppState, mut queue: mpsc::Receiver<Message>) {
    info!("Command dispatcher started");

    while let Some(msg) = queue.recv().await {
        handle_message(&ctx, msg).await;
    }

    info!("Message queue closed, dispatcher stopping");
}

/// Process a single message to completion.
///
/// Writes finish before this returns. Read-only commands are handed to a
/// detached task that sends its own reply.
pub async fn handle_message(ctx: &AppState, msg: Message) {
    let command = match Command::parse(&msg.text) {
        Ok(Some(command)) => command,
        Ok(None) => return,
        Err(e) => {
            warn!("{} sent an invalid command in {}: {}", msg.user, msg.channel, e);
            ctx.reply(&msg.channel, &e.reply()).await;
            return;
        }
    };

    debug!("{} in {}: {:?}", msg.user, msg.channel, command);

    if command.is_read_only() {
        tokio::spawn(run_read_only(ctx.clone(), msg.channel, command));
        return;
    }

    // Profiles are resolved for write commands only. Chatter, invalid commands
    // and reads never look one up.
    let profile = resolve_profile(ctx, &msg.user).await;

    let result = match command {
        Command::Ask { question } => submit_question(ctx, &profile, &msg.channel, question).await,
        Command::Answer {
            question_id,
            answer,
        } => submit_answer(ctx, &profile, &msg.channel, question_id, answer).await,
        _ => return,
    };

    let reply = result.unwrap_or_else(|e| {
        match &e {
            DispatchError::DuplicateQuestion => info!("{} re-asked an existing question", msg.user),
            _ => error!("Command from {} failed: {}", msg.user, e),
        }
        e.reply()
    });
    ctx.reply(&msg.channel, &reply).await;
}

/// Profile lookup failures are not fatal; the platform id alone keys the user.
async fn resolve_profile(ctx: &AppState, user_id: &str) -> Profile {
    match ctx.profiles.get_profile(user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("{}; continuing with an empty profile", e);
            Profile::unresolved(user_id)
        }
    }
}

async fn submit_question(
    ctx: &AppState,
    profile: &Profile,
    channel: &str,
    text: String,
) -> Result<String, DispatchError> {
    let mut question = Question::new(text, channel, profile.display_name());
    let mut user = User::from_profile(profile);
    let author = question.user_name.clone();

    let question_id = ctx
        .with_db(move |db| {
            if !db.user_exists(&user.slack_user) {
                db.upsert_user(&mut user)?;
            }
            db.link_user_to_question(&user, &mut question)
        })
        .await
        .map_err(|e| match e {
            DispatchError::Storage(source) if source.is_duplicate() => DispatchError::DuplicateQuestion,
            other => other,
        })?;

    info!("Stored question {} from {}", question_id, author);
    Ok(replies::question_saved(&author, question_id))
}

async fn submit_answer(
    ctx: &AppState,
    profile: &Profile,
    channel: &str,
    question_id: i64,
    text: String,
) -> Result<String, DispatchError> {
    let mut answer = Answer::new(text, question_id, channel, profile.display_name());
    let mut user = User::from_profile(profile);
    let author = answer.user_name.clone();

    ctx.with_db(move |db| {
        if !db.user_exists(&user.slack_user) {
            db.upsert_user(&mut user)?;
        }
        db.save_answer(&user, &mut answer)
    })
    .await
    .map_err(|e| match e {
        DispatchError::Storage(source) => DispatchError::AnswerStorage {
            question_id,
            source,
        },
        other => other,
    })?;

    info!("Stored answer to question {} from {}", question_id, author);
    Ok(replies::answer_saved(&author, question_id))
}

async fn run_read_only(ctx: AppState, channel: String, command: Command) {
    let limit = ctx.list_limit;

    let result = match command {
        Command::ListQuestions => ctx
            .with_db(move |db| db.last_n::<Question>(limit))
            .await
            .map(|questions| replies::last_questions(&questions)),
        Command::ListAnswers => ctx
            .with_db(move |db| db.last_n::<Answer>(limit))
            .await
            .map(|answers| replies::last_answers(&answers)),
        Command::QuestionAndAnswers { question_id } => ctx
            .with_db(move |db| match db.question_by_id(question_id)? {
                Some(question) => {
                    let answers = db.answers_for_question(question_id)?;
                    Ok(Some((question, answers)))
                }
                None => Ok(None),
            })
            .await
            .map(|found| match found {
                Some((question, answers)) => replies::question_and_answers(&question, &answers),
                None => replies::question_not_found(question_id),
            }),
        Command::Help => Ok(replies::HELP.to_string()),
        Command::Ask { .. } | Command::Answer { .. } => return,
    };

    let reply = result.unwrap_or_else(|e| {
        error!("Read-only command failed: {}", e);
        e.reply()
    });
    ctx.reply(&channel, &reply).await;
}
