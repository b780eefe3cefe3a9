//! Datawire channels

use super::{
    descriptor::{encode_incr, tr_type, DwCtl, DwLoopCtl, Limits, Plan},
    Channel, CtlParams, EngineKind, Event, Priority,
};
use crate::{
    pac::dw,
    triggers::{TriggerDest, TriggerSource},
};

pub(super) const LIMITS: Limits = Limits {
    max_count: 256,
    incr_bits: 12,
};

const CTL: usize = 0;
const SRC: usize = 1;
const DST: usize = 2;
const X_CTL: usize = 3;
const Y_CTL: usize = 4;
const NEXT: usize = 5;

/// One channel of a Datawire block.
pub(super) struct DwChannel<'a> {
    block: &'a dw::RegisterBlock,
    block_idx: u8,
    channel: u8,
}

impl<'a> DwChannel<'a> {
    pub(super) fn new(block: &'a dw::RegisterBlock, block_idx: u8, channel: u8) -> Self {
        Self {
            block,
            block_idx,
            channel,
        }
    }

    fn ch(&self) -> &'a dw::ChStruct {
        &self.block.ch_struct[self.channel as usize]
    }
}

// A Datawire channel reports one interrupt cause at a time.
fn event_from_cause(cause: u32) -> Event {
    match cause {
        1..=8 => Event::from_bits_truncate(1 << (cause - 1)),
        _ => Event::empty(),
    }
}

impl Channel for DwChannel<'_> {
    fn kind(&self) -> EngineKind {
        EngineKind::Datawire
    }

    fn limits(&self) -> Limits {
        LIMITS
    }

    fn write_descriptor(&self, words: &mut [u32; 8], src: u32, dst: u32, plan: &Plan, p: &CtlParams) {
        let mut ctl = DwCtl::from_bits(0);
        ctl.set_intr_type(tr_type::DESCR);
        ctl.set_tr_in_type(p.tr_in);
        ctl.set_tr_out_type(p.tr_out);
        ctl.set_ch_disable(p.ch_disable);
        ctl.set_src_transfer_size(p.src_word);
        ctl.set_dst_transfer_size(p.dst_word);
        ctl.set_data_size(p.data_size);
        ctl.set_descr_type(plan.descr_type);

        let mut x = DwLoopCtl::from_bits(0);
        x.set_src_incr(encode_incr(plan.src_x, LIMITS.incr_bits));
        x.set_dst_incr(encode_incr(plan.dst_x, LIMITS.incr_bits));
        x.set_count(plan.x_count - 1);

        let mut y = DwLoopCtl::from_bits(0);
        y.set_src_incr(encode_incr(plan.src_y, LIMITS.incr_bits));
        y.set_dst_incr(encode_incr(plan.dst_y, LIMITS.incr_bits));
        y.set_count(plan.y_count - 1);

        *words = [0; 8];
        words[CTL] = ctl.bits();
        words[SRC] = src;
        words[DST] = dst;
        words[X_CTL] = x.bits();
        words[Y_CTL] = y.bits();
        words[NEXT] = p.next;
    }

    fn is_busy(&self) -> bool {
        let status = self.block.status.read();
        self.ch().ch_status.is_set(dw::CH_STATUS_PENDING.mask())
            || (dw::STATUS_ACTIVE.get(status) != 0
                && dw::STATUS_CH_IDX.get(status) == self.channel as u32)
    }

    fn completion_pending(&self) -> bool {
        let ch = self.ch();
        ch.intr.is_set(dw::INTR_CH.mask())
            && ch.ch_status.read_field(dw::CH_STATUS_INTR_CAUSE) == dw::intr_cause::COMPLETION
    }

    fn program(&self, descriptor: u32, priority: Priority) {
        let ch = self.ch();
        ch.ch_ctl.write(0);
        ch.ch_curr_ptr.write(descriptor);
        ch.ch_idx.write(0);
        ch.intr.write(dw::INTR_CH.mask());
        ch.ch_ctl.write(
            dw::CH_CTL_PRIO.val(priority as u32)
                | dw::CH_CTL_PREEMPTABLE.mask()
                | dw::CH_CTL_ENABLED.mask(),
        );
        self.block.ctl.set_bits(dw::CTL_ENABLED.mask());
    }

    fn disable(&self) {
        let ch = self.ch();
        ch.ch_ctl.clear_bits(dw::CH_CTL_ENABLED.mask());
        ch.intr_mask.write(0);
        ch.intr.write(dw::INTR_CH.mask());
    }

    fn set_intr_mask(&self, events: Event) {
        let mask = if events.is_empty() {
            0
        } else {
            dw::INTR_CH.mask()
        };
        self.ch().intr_mask.write(mask);
    }

    fn take_events(&self) -> Event {
        let ch = self.ch();
        if ch.intr.read() & ch.intr_mask.read() & dw::INTR_CH.mask() == 0 {
            return Event::empty();
        }
        let cause = ch.ch_status.read_field(dw::CH_STATUS_INTR_CAUSE);
        ch.intr.write(dw::INTR_CH.mask());
        event_from_cause(cause)
    }

    fn trigger_dest(&self) -> TriggerDest {
        TriggerDest::DwChannel {
            block: self.block_idx,
            channel: self.channel,
        }
    }

    fn trigger_source(&self) -> TriggerSource {
        TriggerSource::DwDone {
            block: self.block_idx,
            channel: self.channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac;

    #[test]
    fn causes_map_onto_events() {
        assert_eq!(event_from_cause(dw::intr_cause::NONE), Event::empty());
        assert_eq!(
            event_from_cause(dw::intr_cause::COMPLETION),
            Event::TRANSFER_COMPLETE
        );
        assert_eq!(
            event_from_cause(dw::intr_cause::CURR_PTR_NULL),
            Event::CURR_PTR_NULL
        );
        assert_eq!(
            event_from_cause(dw::intr_cause::DESCR_BUS_ERROR),
            Event::DESCR_BUS_ERROR
        );
        assert_eq!(event_from_cause(9), Event::empty());
    }

    #[test]
    fn busy_follows_pending_and_active_channel() {
        let regs = pac::detached::<dw::RegisterBlock>();
        let ch = DwChannel::new(&regs, 0, 3);
        assert!(!ch.is_busy());

        regs.ch_struct[3].ch_status.write(dw::CH_STATUS_PENDING.mask());
        assert!(ch.is_busy());
        regs.ch_struct[3].ch_status.write(0);

        regs.status
            .write(dw::STATUS_ACTIVE.mask() | dw::STATUS_CH_IDX.val(2));
        assert!(!ch.is_busy());
        regs.status
            .write(dw::STATUS_ACTIVE.mask() | dw::STATUS_CH_IDX.val(3));
        assert!(ch.is_busy());
    }

    #[test]
    fn program_enables_channel_and_block() {
        let regs = pac::detached::<dw::RegisterBlock>();
        let ch = DwChannel::new(&regs, 1, 7);
        ch.program(0x0800_0040, Priority::Medium);

        let ch_ctl = regs.ch_struct[7].ch_ctl.read();
        assert_eq!(dw::CH_CTL_PRIO.get(ch_ctl), 2);
        assert!(ch_ctl & dw::CH_CTL_ENABLED.mask() != 0);
        assert_eq!(regs.ch_struct[7].ch_curr_ptr.read(), 0x0800_0040);
        assert!(regs.ctl.is_set(dw::CTL_ENABLED.mask()));

        ch.disable();
        assert!(!regs.ch_struct[7].ch_ctl.is_set(dw::CH_CTL_ENABLED.mask()));
    }

    #[test]
    fn masked_interrupt_is_ignored() {
        let regs = pac::detached::<dw::RegisterBlock>();
        let ch = DwChannel::new(&regs, 0, 0);
        regs.ch_struct[0].intr.write(dw::INTR_CH.mask());
        regs.ch_struct[0]
            .ch_status
            .write(dw::intr_cause::SRC_BUS_ERROR);
        assert_eq!(ch.take_events(), Event::empty());

        ch.set_intr_mask(Event::SRC_BUS_ERROR);
        assert_eq!(ch.take_events(), Event::SRC_BUS_ERROR);
    }
}
