//! The capability shared by everything that maps onto a remote document.

use serde_json::Value;

use crate::client::Client;
use crate::error::Result;
use crate::record::Record;

/// A value backed by a [`Record`].
///
/// Plain records implement it directly; users and roles wrap a record of
/// their fixed class and delegate to it. The provided methods are shorthand
/// for the matching [`Client`] calls.
pub trait Persistable: Send {
    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn save(&mut self, client: &Client) -> Result<()> {
        client.save(self)
    }

    fn fetch(&mut self, client: &Client) -> Result<()> {
        client.fetch(self)
    }

    fn refresh(&mut self, client: &Client) -> Result<()> {
        client.refresh(self)
    }

    fn delete(&mut self, client: &Client) -> Result<()> {
        client.delete(self)
    }

    fn update(&mut self, client: &Client, partial: &Value) -> Result<()> {
        client.update(self, partial)
    }
}

impl Persistable for Record {
    fn record(&self) -> &Record {
        self
    }

    fn record_mut(&mut self) -> &mut Record {
        self
    }
}
