use tokio::sync::watch;

/// Pure state transition: the whole next state is computed from the current one.
pub type Reducer<S, A> = fn(&S, A) -> S;

/// Owns one screen's view state.
///
/// The value is only ever replaced as a whole through the reducer; readers
/// either take a snapshot or subscribe to the watch channel.
pub struct StateHolder<S, A> {
    state: watch::Sender<S>,
    reducer: Reducer<S, A>,
}

impl<S: Clone, A> StateHolder<S, A> {
    pub fn new(initial: S, reducer: Reducer<S, A>) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state, reducer }
    }

    pub fn current(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, action: A) {
        let next = {
            let current = self.state.borrow();
            (self.reducer)(&current, action)
        };
        self.state.send_replace(next);
    }

    /// Dispatch `start` now and `finish` when the returned guard drops.
    ///
    /// Keeps loading flags honest on every exit path, including errors and
    /// cancelled futures.
    pub fn busy(&self, start: A, finish: A) -> BusyGuard<'_, S, A> {
        self.dispatch(start);
        BusyGuard {
            holder: self,
            finish: Some(finish),
        }
    }
}

pub struct BusyGuard<'a, S: Clone, A> {
    holder: &'a StateHolder<S, A>,
    finish: Option<A>,
}

impl<S: Clone, A> Drop for BusyGuard<'_, S, A> {
    fn drop(&mut self) {
        if let Some(action) = self.finish.take() {
            self.holder.dispatch(action);
        }
    }
}
