use crate::facade::{CrudFacade, RequestParams};
use crate::response::ResponseEnvelope;
use crate::store::DocumentStore;

use super::command::Command;

pub fn run<S: DocumentStore + ?Sized>(api: &CrudFacade<'_, S>, cmd: Command) -> ResponseEnvelope {
    match cmd {
        Command::Get { collection, id: Some(id), .. } => api.retrieve_by_id(&collection, Some(&id)),
        Command::Get { collection, id: None, filters, params } => {
            api.retrieve_list(&collection, &RequestParams { filters, params })
        }
        Command::Insert { collection, fields } => api.insert(&collection, &fields),
        Command::Update { collection, id, fields } => api.update(&collection, Some(&id), &fields),
        Command::Delete { collection, id: Some(id), .. } => api.delete_by_id(&collection, Some(&id)),
        Command::Delete { collection, id: None, filters } => api.delete_by_filter(&collection, &filters),
        Command::Link { collection, id, field, foreign_id } => {
            api.add_to_collection(&collection, &id, &field, &foreign_id)
        }
        Command::Unlink { collection, id, field, foreign_id } => {
            api.remove_from_collection(&collection, &id, &field, &foreign_id)
        }
        Command::SetLinks { collection, id, field, ids } => {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            api.replace_collection(&collection, &id, &field, &ids)
        }
        Command::ClearLinks { collection, id, field } => api.clear_collection(&collection, &id, &field),
    }
}
