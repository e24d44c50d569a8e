use crate::dataflow::{Relay, Task, TaskHandle, relay};
use crate::lifecycle::LifecycleController;
use futures::stream::StreamExt;
use shared::{ControlMsg, ControlReply};
use std::rc::Rc;

/// Deferred answer channel of the messaging bridge.
pub type ReplySender = Box<dyn FnOnce(ControlReply)>;

pub struct ControlRequest {
    pub msg: ControlMsg,
    pub reply: Option<ReplySender>,
}

impl ControlRequest {
    pub fn new(msg: ControlMsg) -> Self {
        Self { msg, reply: None }
    }

    pub fn with_reply(msg: ControlMsg, reply: impl FnOnce(ControlReply) + 'static) -> Self {
        Self {
            msg,
            reply: Some(Box::new(reply)),
        }
    }
}

/// Create the processor that applies inbound control messages one at a time
pub fn create_control_message_handler(controller: Rc<LifecycleController>) -> (Relay<ControlRequest>, TaskHandle) {
    let (control_msg_relay, mut control_msg_stream) = relay::<ControlRequest>();

    let message_handler = Task::start_droppable(async move {
        while let Some(ControlRequest { msg, reply }) = control_msg_stream.next().await {
            let answer = handle_control_msg(&controller, msg).await;
            match (answer, reply) {
                (Some(answer), Some(reply)) => reply(answer),
                (Some(_), None) => log::debug!("Reply dropped, sender is not waiting"),
                (None, _) => {}
            }
        }
    });

    (control_msg_relay, message_handler)
}

/// Apply one control message; only status queries produce a reply.
pub async fn handle_control_msg(controller: &LifecycleController, msg: ControlMsg) -> Option<ControlReply> {
    match msg {
        ControlMsg::SettingsChanged { settings } => controller.apply_settings(settings),
        ControlMsg::Reinitialize => controller.reinitialize().await,
        ControlMsg::GetStatus => return Some(ControlReply::Status(controller.status())),
        ControlMsg::TogglePip => {
            if let Err(error) = controller.toggle().await {
                log::error!("{error}");
            }
        }
        ControlMsg::StartPipManager => controller.start(),
        ControlMsg::StopPipManager => controller.stop(),
        ControlMsg::PageReady { url } => {
            log::debug!("Page ready: {url}");
            controller.check_and_init();
        }
    }
    None
}
