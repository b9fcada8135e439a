use super::error::PresentError;
use super::gui::Gui;
use super::presenter::Presenter;
use super::renderer::Renderer;
use super::request::{Batch, Request, RequestAction, RequestObject};
use crate::window::Client;

impl<R: Renderer, G: Gui<R::Backend>> Presenter<R, G> {
    /// Applies a batch of requests in arrival order.
    ///
    /// Each request goes to the renderer first; canvas requests then bind
    /// or release the window and surface (a deleted canvas closes its
    /// window once its surface is gone), and record requests feed the
    /// canvas recorder. The first failure aborts the batch: earlier requests
    /// stay applied. The batch is consumed either way.
    pub fn submit<C: Client>(&mut self, client: &mut C, batch: Batch) -> Result<(), PresentError> {
        if batch.is_empty() {
            log::trace!("skip presenter submit for empty batch");
            return Ok(());
        }

        log::trace!("submit {} requests to the presenter", batch.len());
        self.diagnostics.inspect(&batch);

        log::debug!("renderer processes {} requests", batch.len());
        for request in &batch {
            self.route(client, request)?;
        }
        Ok(())
    }

    fn route<C: Client>(&mut self, client: &mut C, request: &Request) -> Result<(), PresentError> {
        self.renderer_mut()
            .apply(request)
            .map_err(|reason| PresentError::Renderer {
                id: request.id,
                action: request.action,
                object: request.object,
                reason,
            })?;

        match (request.object, request.action) {
            (RequestObject::Canvas, RequestAction::Create) => {
                log::debug!("process canvas creation request");
                self.create_canvas(client, request)
            }
            (RequestObject::Canvas, RequestAction::Delete) => {
                log::debug!("process canvas deletion request");
                self.delete_canvas(request.id)?;
                client.destroy_window(request.id);
                Ok(())
            }
            (RequestObject::Record, _) => self.record_request(request),
            _ => Ok(()),
        }
    }
}
